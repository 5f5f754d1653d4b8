//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Photobooth - live event photobooth server and camera-side tools
#[derive(Parser, Debug)]
#[command(name = "photobooth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the coordination server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Public base URL for share links (overrides PUBLIC_URL)
        #[arg(long)]
        public_url: Option<String>,
    },

    /// Run the remote camera agent against a server
    Agent {
        /// Server base URL
        #[arg(long, default_value = "http://localhost:3000")]
        server: String,

        /// Camera command to run for each capture (overrides CAMERA_COMMAND)
        #[arg(long)]
        camera_command: Option<String>,
    },

    /// Watch a folder and upload newly written photos
    Watch {
        /// Folder the camera software writes into
        folder: PathBuf,

        /// Server base URL
        #[arg(long, default_value = "http://localhost:3000")]
        server: String,

        /// Open the returned QR code image after an upload
        #[arg(long)]
        open_qr: bool,
    },
}
