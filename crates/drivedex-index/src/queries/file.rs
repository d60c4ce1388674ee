use rusqlite::{Connection, OptionalExtension, params};
use std::str::FromStr;

use drivedex_types::{AccessState, FileId, now_rfc3339};

use crate::records::FileRecord;
use crate::{Error, Result};

/// Upsert one file row keyed by its Drive id.
///
/// A forbidden row stays forbidden no matter what the incoming record says;
/// only [`set_access`] resets it. `path` is kept when the incoming record
/// has none, so a metadata refresh does not erase a reconstructed path.
pub fn insert_or_update(conn: &Connection, file: &FileRecord) -> Result<()> {
    let now = now_rfc3339();
    conn.execute(
        r#"
        INSERT INTO files (id, name, mime_type, path, access, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        ON CONFLICT(id) DO UPDATE SET
            name = ?2,
            mime_type = ?3,
            path = COALESCE(?4, path),
            access = CASE WHEN files.access = 'forbidden' THEN files.access ELSE ?5 END,
            updated_at = ?6
        "#,
        params![
            file.id.as_str(),
            &file.name,
            &file.mime_type,
            &file.path,
            file.access.as_str(),
            &now
        ],
    )?;

    Ok(())
}

pub fn upsert_many(conn: &Connection, files: &[FileRecord]) -> Result<usize> {
    for file in files {
        insert_or_update(conn, file)?;
    }
    Ok(files.len())
}

pub fn get(conn: &Connection, file_id: &FileId) -> Result<Option<FileRecord>> {
    let result = conn
        .query_row(
            r#"
            SELECT id, name, mime_type, path, access
            FROM files
            WHERE id = ?1
            "#,
            [file_id.as_str()],
            row_to_record,
        )
        .optional()?;

    Ok(result)
}

pub fn list(
    conn: &Connection,
    limit: Option<usize>,
    include_forbidden: bool,
) -> Result<Vec<FileRecord>> {
    let mut where_clauses: Vec<&str> = Vec::new();
    if !include_forbidden {
        where_clauses.push("access != 'forbidden'");
    }

    let where_clause = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };
    let limit_clause = limit.map(|l| format!("LIMIT {}", l)).unwrap_or_default();

    let query = format!(
        r#"
        SELECT id, name, mime_type, path, access
        FROM files
        {}
        ORDER BY updated_at DESC
        {}
        "#,
        where_clause, limit_clause
    );

    let mut stmt = conn.prepare(&query)?;
    let files = stmt
        .query_map([], row_to_record)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(files)
}

/// Flip a file's access state. Errors when the row does not exist: forbidden
/// markers may only be attached to files the cache already knows.
pub fn set_access(conn: &Connection, file_id: &FileId, access: AccessState) -> Result<()> {
    let changed = conn.execute(
        r#"
        UPDATE files
        SET access = ?2, updated_at = ?3
        WHERE id = ?1
        "#,
        params![file_id.as_str(), access.as_str(), now_rfc3339()],
    )?;

    if changed == 0 {
        return Err(Error::Query(format!(
            "cannot mark unknown file '{}'; create the file row first",
            file_id
        )));
    }

    Ok(())
}

pub fn set_path(conn: &Connection, file_id: &FileId, path: &str) -> Result<()> {
    let changed = conn.execute(
        r#"
        UPDATE files
        SET path = ?2, updated_at = ?3
        WHERE id = ?1
        "#,
        params![file_id.as_str(), path, now_rfc3339()],
    )?;

    if changed == 0 {
        return Err(Error::Query(format!(
            "cannot set path on unknown file '{}'",
            file_id
        )));
    }

    Ok(())
}

pub fn count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
    Ok(count as usize)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> std::result::Result<FileRecord, rusqlite::Error> {
    let access_raw: String = row.get(4)?;
    Ok(FileRecord {
        id: FileId::from(row.get::<_, String>(0)?),
        name: row.get(1)?,
        mime_type: row.get(2)?,
        path: row.get(3)?,
        access: AccessState::from_str(&access_raw).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use drivedex_types::MIME_PDF;

    fn pdf(id: &str, name: &str) -> FileRecord {
        FileRecord {
            id: FileId::from(id),
            name: name.to_string(),
            mime_type: MIME_PDF.to_string(),
            path: None,
            access: AccessState::Active,
        }
    }

    #[test]
    fn upsert_twice_keeps_row_count() {
        let db = Database::open_in_memory().unwrap();
        let batch = vec![pdf("f1", "a.pdf"), pdf("f2", "b.pdf")];

        db.upsert_files(&batch).unwrap();
        assert_eq!(db.count_files().unwrap(), 2);

        db.upsert_files(&batch).unwrap();
        assert_eq!(db.count_files().unwrap(), 2);
    }

    #[test]
    fn upsert_updates_in_place() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_files(&[pdf("f1", "old name.pdf")]).unwrap();

        db.upsert_files(&[pdf("f1", "new name.pdf")]).unwrap();

        let row = db.get_file(&FileId::from("f1")).unwrap().unwrap();
        assert_eq!(row.name, "new name.pdf");
        assert_eq!(db.count_files().unwrap(), 1);
    }

    #[test]
    fn forbidden_is_sticky_across_upserts() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_files(&[pdf("f1", "a.pdf")]).unwrap();
        db.set_file_access(&FileId::from("f1"), AccessState::Forbidden)
            .unwrap();

        // a later metadata refresh claims the file is active again
        db.upsert_files(&[pdf("f1", "a.pdf")]).unwrap();

        let row = db.get_file(&FileId::from("f1")).unwrap().unwrap();
        assert_eq!(row.access, AccessState::Forbidden);

        // manual reset is the only way back
        db.set_file_access(&FileId::from("f1"), AccessState::Active)
            .unwrap();
        let row = db.get_file(&FileId::from("f1")).unwrap().unwrap();
        assert_eq!(row.access, AccessState::Active);
    }

    #[test]
    fn list_excludes_forbidden_by_default() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_files(&[pdf("f1", "a.pdf"), pdf("f2", "b.pdf")])
            .unwrap();
        db.set_file_access(&FileId::from("f2"), AccessState::Forbidden)
            .unwrap();

        let visible = db.list_files(None, false).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id.as_str(), "f1");

        let all = db.list_files(None, true).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn marking_unknown_file_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .set_file_access(&FileId::from("ghost"), AccessState::Forbidden)
            .unwrap_err();
        assert!(matches!(err, Error::Query(_)));
    }

    #[test]
    fn upsert_keeps_existing_path_when_incoming_has_none() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_files(&[pdf("f1", "a.pdf")]).unwrap();
        db.set_file_path(&FileId::from("f1"), "/Books/a.pdf").unwrap();

        db.upsert_files(&[pdf("f1", "a.pdf")]).unwrap();

        let row = db.get_file(&FileId::from("f1")).unwrap().unwrap();
        assert_eq!(row.path.as_deref(), Some("/Books/a.pdf"));
    }
}
