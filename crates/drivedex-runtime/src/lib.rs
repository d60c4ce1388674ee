pub mod config;
pub mod error;
pub mod services;
pub mod snapshot;

pub use config::{Config, resolve_workspace_path};
pub use error::{Error, Result};
pub use snapshot::SnapshotStore;
