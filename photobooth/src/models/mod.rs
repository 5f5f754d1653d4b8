//! Data models for photobooth entities.

mod command;
mod photo;
mod session;

pub use command::{Command, CommandKind};
pub use photo::Photo;
pub use session::{Session, SessionStatus};
