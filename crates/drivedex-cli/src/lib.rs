mod args;
mod commands;
mod handlers;
pub mod types;

pub use args::{Cli, Commands, DbCommand, FilesCommand, RevisionsCommand, SessionsCommand};
pub use commands::run;
