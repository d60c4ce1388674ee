use rusqlite::Connection;
use std::path::Path;

use drivedex_types::{AccessState, CursorScope, FileId, PageToken};

use crate::records::{
    ChangeRecord, CursorRecord, FileRecord, RevisionFileStats, RevisionRecord, SessionSummary,
};
use crate::schema;
use crate::{Error, Result, queries};

/// Handle on the local metadata cache.
///
/// Owns the single long-lived connection; constructed explicitly and passed
/// to whoever needs it, so tests can run against `open_in_memory`.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path).map_err(|err| {
            Error::Query(format!(
                "failed to open database {}: {}",
                db_path.display(),
                err
            ))
        })?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self { conn };
        schema::init_schema(&db.conn)?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self { conn };
        schema::init_schema(&db.conn)?;
        Ok(db)
    }

    // --- files ---

    pub fn upsert_file(&self, file: &FileRecord) -> Result<()> {
        queries::file::insert_or_update(&self.conn, file)
    }

    pub fn upsert_files(&self, files: &[FileRecord]) -> Result<usize> {
        queries::file::upsert_many(&self.conn, files)
    }

    pub fn get_file(&self, file_id: &FileId) -> Result<Option<FileRecord>> {
        queries::file::get(&self.conn, file_id)
    }

    pub fn list_files(
        &self,
        limit: Option<usize>,
        include_forbidden: bool,
    ) -> Result<Vec<FileRecord>> {
        queries::file::list(&self.conn, limit, include_forbidden)
    }

    pub fn set_file_access(&self, file_id: &FileId, access: AccessState) -> Result<()> {
        queries::file::set_access(&self.conn, file_id, access)
    }

    pub fn set_file_path(&self, file_id: &FileId, path: &str) -> Result<()> {
        queries::file::set_path(&self.conn, file_id, path)
    }

    pub fn count_files(&self) -> Result<usize> {
        queries::file::count(&self.conn)
    }

    // --- changes ---

    pub fn insert_changes(&self, changes: &[ChangeRecord]) -> Result<usize> {
        queries::change::insert_many(&self.conn, changes)
    }

    pub fn list_changes(&self, limit: Option<usize>) -> Result<Vec<ChangeRecord>> {
        queries::change::list(&self.conn, limit)
    }

    pub fn count_changes(&self) -> Result<usize> {
        queries::change::count(&self.conn)
    }

    // --- revisions ---

    pub fn upsert_revisions(&self, revisions: &[RevisionRecord]) -> Result<usize> {
        queries::revision::upsert_many(&self.conn, revisions)
    }

    pub fn list_revisions(&self, limit: Option<usize>) -> Result<Vec<RevisionRecord>> {
        queries::revision::list(&self.conn, limit)
    }

    pub fn count_revisions(&self) -> Result<usize> {
        queries::revision::count(&self.conn)
    }

    pub fn revision_stats(&self, limit: Option<usize>) -> Result<Vec<RevisionFileStats>> {
        queries::revision::stats_by_file(&self.conn, limit)
    }

    // --- page cursors ---

    pub fn set_cursor(&self, scope: CursorScope, token: &PageToken) -> Result<()> {
        queries::cursor::set(&self.conn, scope, token)
    }

    pub fn current_cursor(&self, scope: CursorScope) -> Result<Option<CursorRecord>> {
        queries::cursor::current(&self.conn, scope)
    }

    pub fn clear_cursor(&self, scope: CursorScope) -> Result<()> {
        queries::cursor::clear(&self.conn, scope)
    }

    // --- file sessions ---

    pub fn find_session_by_files(&self, files: &[FileId]) -> Result<Option<i64>> {
        queries::session::find_by_exact_files(&self.conn, files)
    }

    pub fn find_session_by_name(&self, name: &str) -> Result<Option<i64>> {
        queries::session::find_by_name(&self.conn, name)
    }

    pub fn create_session(&self, name: Option<&str>, files: &[FileId]) -> Result<i64> {
        queries::session::create(&self.conn, name, files)
    }

    pub fn touch_session(&self, session_id: i64) -> Result<()> {
        queries::session::touch(&self.conn, session_id)
    }

    pub fn get_session(&self, session_id: i64) -> Result<Option<SessionSummary>> {
        queries::session::get(&self.conn, session_id)
    }

    pub fn list_sessions(&self, limit: Option<usize>) -> Result<Vec<SessionSummary>> {
        queries::session::list(&self.conn, limit)
    }

    pub fn session_files(&self, session_id: i64) -> Result<Vec<FileRecord>> {
        queries::session::files_of(&self.conn, session_id)
    }

    // --- maintenance ---

    pub fn vacuum(&self) -> Result<()> {
        self.conn.execute("VACUUM", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_initialization() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.count_files().unwrap(), 0);
        assert_eq!(db.count_changes().unwrap(), 0);
        assert_eq!(db.count_revisions().unwrap(), 0);
        assert!(db.list_sessions(None).unwrap().is_empty());
    }

    #[test]
    fn open_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("drivedex.db");

        {
            let db = Database::open(&db_path).unwrap();
            db.upsert_file(&FileRecord {
                id: FileId::from("f1"),
                name: "a.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                path: None,
                access: AccessState::Active,
            })
            .unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        assert_eq!(db.count_files().unwrap(), 1);
    }

    #[test]
    fn revision_requires_existing_file() {
        let db = Database::open_in_memory().unwrap();

        let orphan = RevisionRecord {
            id: drivedex_types::RevisionId::from("r1"),
            file_id: FileId::from("missing"),
            mime_type: "application/pdf".to_string(),
            modified_time: "2024-01-01T10:00:00Z".to_string(),
        };

        assert!(db.upsert_revisions(&[orphan]).is_err());
    }
}
