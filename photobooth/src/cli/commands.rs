//! CLI command execution.

use anyhow::Result;

use crate::agent::{run_agent, run_watcher, AgentOptions, WatchOptions};
use crate::config::Config;
use crate::server;

use super::args::{Cli, Commands};

/// Dispatch a parsed command line.
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { port, public_url } => {
            let mut config = Config::from_env();
            if let Some(port) = port {
                config.port = port;
                if std::env::var("PUBLIC_URL").is_err() && public_url.is_none() {
                    config.public_url = format!("http://localhost:{port}");
                }
            }
            if let Some(url) = public_url {
                config.public_url = url;
            }
            server::start_server(config).await
        }

        Commands::Agent {
            server,
            camera_command,
        } => {
            let options = AgentOptions {
                server_url: server,
                camera_command: camera_command
                    .unwrap_or_else(|| Config::from_env().camera_command),
            };
            run_agent(options).await
        }

        Commands::Watch {
            folder,
            server,
            open_qr,
        } => {
            let options = WatchOptions {
                folder,
                server_url: server,
                open_qr,
            };
            run_watcher(options).await
        }
    }
}
