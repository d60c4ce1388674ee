// Drive v3 metadata client
// Fetches change/file/revision pages; never mutates anything remote

pub mod client;
pub mod error;
pub mod paths;
pub mod walker;
pub mod wire;

pub use client::{DriveApi, HttpDriveClient};
pub use error::{Error, Result};
pub use paths::reconstruct_path;
pub use walker::{FeedPage, Walk, walk_changes, walk_feed, walk_files};
