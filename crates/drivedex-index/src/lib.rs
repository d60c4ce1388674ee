// SQLite metadata cache
// Rows are keyed by Drive identifiers; overlapping batches upsert, never duplicate

mod db;
mod queries;
mod records;
mod schema;

pub mod error;

// Public API
pub use db::Database;
pub use error::{Error, Result};
pub use records::{
    ChangeRecord, CursorRecord, FileRecord, RevisionFileStats, RevisionRecord, SessionSummary,
};
