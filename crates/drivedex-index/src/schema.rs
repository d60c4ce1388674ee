use rusqlite::Connection;

use crate::Result;

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 1;

// NOTE: Cache Design Rationale
//
// Why natural-key primary keys (Drive ids)?
// - Change-feed pages may be reprocessed after a crash or manual token reset
// - Upsert-by-id makes every persistence call safe to repeat with overlap
// - Only changes lack a natural key; they get a generated UUID and may
//   legitimately duplicate across reprocessed pages
//
// Why a sticky access column instead of a boolean flag?
// - Drive keeps answering 403 for files the account lost; retrying is wasted
//   requests forever
// - 'forbidden' must survive later metadata refreshes of the same file,
//   so the upsert never downgrades it (manual reset only)
//
// Why one cursor row per scope?
// - There is exactly one logical resume point per feed; history rows were
//   a source of "which token do I resume from" confusion
//
// changes carries its own file_name/mime copy and no FK: it is an
// append-only observation log, valid even when the file row is pruned

pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version != 0 && current_version != SCHEMA_VERSION {
        drop_all_tables(conn)?;
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            path TEXT,
            access TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS changes (
            id TEXT PRIMARY KEY,
            file_id TEXT NOT NULL,
            file_name TEXT NOT NULL,
            file_mime_type TEXT NOT NULL,
            time TEXT NOT NULL,
            change_type TEXT NOT NULL,
            removed BOOLEAN NOT NULL DEFAULT 0,
            page_token TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS revisions (
            id TEXT PRIMARY KEY,
            file_id TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            modified_time TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (file_id) REFERENCES files(id)
        );

        CREATE TABLE IF NOT EXISTS page_cursors (
            scope TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS file_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            nused INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS file_session_files (
            session_id INTEGER NOT NULL,
            file_id TEXT NOT NULL,
            UNIQUE(session_id, file_id),
            FOREIGN KEY (session_id) REFERENCES file_sessions(id),
            FOREIGN KEY (file_id) REFERENCES files(id)
        );

        CREATE INDEX IF NOT EXISTS idx_changes_file ON changes(file_id);
        CREATE INDEX IF NOT EXISTS idx_changes_time ON changes(time DESC);
        CREATE INDEX IF NOT EXISTS idx_revisions_file ON revisions(file_id);
        CREATE INDEX IF NOT EXISTS idx_session_files_session ON file_session_files(session_id);
        "#,
    )?;

    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;

    Ok(())
}

fn drop_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DROP TABLE IF EXISTS file_session_files;
        DROP TABLE IF EXISTS file_sessions;
        DROP TABLE IF EXISTS page_cursors;
        DROP TABLE IF EXISTS revisions;
        DROP TABLE IF EXISTS changes;
        DROP TABLE IF EXISTS files;
        "#,
    )?;
    Ok(())
}
