use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;

use drivedex_types::{FileId, now_rfc3339};

use crate::records::{FileRecord, SessionSummary};
use crate::{Error, Result};

/// Find the session whose membership set equals `files` exactly.
///
/// Overlap is not a match: a session holding a superset or subset of the
/// requested ids is a different reading session. Candidates are narrowed by
/// member count first, then compared set-for-set.
pub fn find_by_exact_files(conn: &Connection, files: &[FileId]) -> Result<Option<i64>> {
    let wanted: BTreeSet<&str> = files.iter().map(|f| f.as_str()).collect();
    if wanted.is_empty() {
        return Ok(None);
    }

    let mut stmt = conn.prepare(
        r#"
        SELECT session_id
        FROM file_session_files
        GROUP BY session_id
        HAVING COUNT(*) = ?1
        "#,
    )?;

    let candidates = stmt
        .query_map([wanted.len() as i64], |row| row.get::<_, i64>(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    for session_id in candidates {
        let members: BTreeSet<String> = member_ids(conn, session_id)?;
        if members.len() == wanted.len() && members.iter().map(String::as_str).eq(wanted.iter().copied())
        {
            return Ok(Some(session_id));
        }
    }

    Ok(None)
}

/// Create a session holding exactly `files`. Membership rows are unique per
/// (session, file); duplicate ids in the input collapse to one row.
pub fn create(conn: &Connection, name: Option<&str>, files: &[FileId]) -> Result<i64> {
    if files.is_empty() {
        return Err(Error::Query("refusing to create an empty session".to_string()));
    }

    let now = now_rfc3339();
    conn.execute(
        r#"
        INSERT INTO file_sessions (name, nused, created_at, updated_at)
        VALUES (?1, 0, ?2, ?2)
        "#,
        params![name, &now],
    )?;
    let session_id = conn.last_insert_rowid();

    let unique: BTreeSet<&str> = files.iter().map(|f| f.as_str()).collect();
    for file_id in unique {
        conn.execute(
            r#"
            INSERT OR IGNORE INTO file_session_files (session_id, file_id)
            VALUES (?1, ?2)
            "#,
            params![session_id, file_id],
        )?;
    }

    Ok(session_id)
}

/// Bump the use counter of a reopened session
pub fn touch(conn: &Connection, session_id: i64) -> Result<()> {
    let changed = conn.execute(
        r#"
        UPDATE file_sessions
        SET nused = nused + 1, updated_at = ?2
        WHERE id = ?1
        "#,
        params![session_id, now_rfc3339()],
    )?;

    if changed == 0 {
        return Err(Error::Query(format!("no session with id {}", session_id)));
    }

    Ok(())
}

pub fn get(conn: &Connection, session_id: i64) -> Result<Option<SessionSummary>> {
    let result = conn
        .query_row(
            r#"
            SELECT s.id, s.name, s.nused, s.updated_at,
                   (SELECT COUNT(*) FROM file_session_files m WHERE m.session_id = s.id)
            FROM file_sessions s
            WHERE s.id = ?1
            "#,
            [session_id],
            row_to_summary,
        )
        .optional()?;

    Ok(result)
}

pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let result = conn
        .query_row(
            r#"
            SELECT id
            FROM file_sessions
            WHERE name = ?1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
            [name],
            |row| row.get(0),
        )
        .optional()?;

    Ok(result)
}

pub fn list(conn: &Connection, limit: Option<usize>) -> Result<Vec<SessionSummary>> {
    let limit_clause = limit.map(|l| format!("LIMIT {}", l)).unwrap_or_default();
    let query = format!(
        r#"
        SELECT s.id, s.name, s.nused, s.updated_at,
               (SELECT COUNT(*) FROM file_session_files m WHERE m.session_id = s.id)
        FROM file_sessions s
        ORDER BY s.updated_at DESC
        {}
        "#,
        limit_clause
    );

    let mut stmt = conn.prepare(&query)?;
    let sessions = stmt
        .query_map([], row_to_summary)?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(sessions)
}

/// Member files of a session, forbidden ones included: reopening decides
/// what to do with them, the index just reports membership.
pub fn files_of(conn: &Connection, session_id: i64) -> Result<Vec<FileRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT f.id, f.name, f.mime_type, f.path, f.access
        FROM file_session_files m
        JOIN files f ON f.id = m.file_id
        WHERE m.session_id = ?1
        ORDER BY f.name
        "#,
    )?;

    let files = stmt
        .query_map([session_id], |row| {
            use std::str::FromStr;
            let access_raw: String = row.get(4)?;
            Ok(FileRecord {
                id: FileId::from(row.get::<_, String>(0)?),
                name: row.get(1)?,
                mime_type: row.get(2)?,
                path: row.get(3)?,
                access: drivedex_types::AccessState::from_str(&access_raw).unwrap_or_default(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(files)
}

fn member_ids(conn: &Connection, session_id: i64) -> Result<BTreeSet<String>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT file_id
        FROM file_session_files
        WHERE session_id = ?1
        "#,
    )?;

    let ids = stmt
        .query_map([session_id], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<BTreeSet<_>, rusqlite::Error>>()?;

    Ok(ids)
}

fn row_to_summary(row: &rusqlite::Row<'_>) -> std::result::Result<SessionSummary, rusqlite::Error> {
    Ok(SessionSummary {
        id: row.get(0)?,
        name: row.get(1)?,
        nused: row.get(2)?,
        updated_at: row.get(3)?,
        file_count: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::records::FileRecord;
    use drivedex_types::{AccessState, MIME_PDF};

    fn seed_files(db: &Database, ids: &[&str]) {
        let records: Vec<FileRecord> = ids
            .iter()
            .map(|id| FileRecord {
                id: FileId::from(*id),
                name: format!("{}.pdf", id),
                mime_type: MIME_PDF.to_string(),
                path: None,
                access: AccessState::Active,
            })
            .collect();
        db.upsert_files(&records).unwrap();
    }

    fn ids(raw: &[&str]) -> Vec<FileId> {
        raw.iter().map(|s| FileId::from(*s)).collect()
    }

    #[test]
    fn exact_set_matches_regardless_of_order() {
        let db = Database::open_in_memory().unwrap();
        seed_files(&db, &["f1", "f2", "f3"]);

        let session = db.create_session(None, &ids(&["f1", "f2"])).unwrap();

        assert_eq!(
            db.find_session_by_files(&ids(&["f2", "f1"])).unwrap(),
            Some(session)
        );
    }

    #[test]
    fn overlapping_or_disjoint_sets_do_not_match() {
        let db = Database::open_in_memory().unwrap();
        seed_files(&db, &["f1", "f2", "f3", "f4"]);
        db.create_session(None, &ids(&["f1", "f2"])).unwrap();

        // subset
        assert_eq!(db.find_session_by_files(&ids(&["f1"])).unwrap(), None);
        // superset
        assert_eq!(
            db.find_session_by_files(&ids(&["f1", "f2", "f3"])).unwrap(),
            None
        );
        // partial overlap, same cardinality
        assert_eq!(
            db.find_session_by_files(&ids(&["f1", "f3"])).unwrap(),
            None
        );
        // disjoint
        assert_eq!(
            db.find_session_by_files(&ids(&["f3", "f4"])).unwrap(),
            None
        );
    }

    #[test]
    fn duplicate_input_ids_collapse() {
        let db = Database::open_in_memory().unwrap();
        seed_files(&db, &["f1", "f2"]);

        let session = db
            .create_session(None, &ids(&["f1", "f2", "f1"]))
            .unwrap();

        let summary = db.get_session(session).unwrap().unwrap();
        assert_eq!(summary.file_count, 2);
        assert_eq!(
            db.find_session_by_files(&ids(&["f1", "f2"])).unwrap(),
            Some(session)
        );
    }

    #[test]
    fn touch_increments_use_counter() {
        let db = Database::open_in_memory().unwrap();
        seed_files(&db, &["f1"]);
        let session = db.create_session(Some("evening"), &ids(&["f1"])).unwrap();

        db.touch_session(session).unwrap();
        db.touch_session(session).unwrap();

        let summary = db.get_session(session).unwrap().unwrap();
        assert_eq!(summary.nused, 2);
        assert_eq!(summary.name.as_deref(), Some("evening"));
    }

    #[test]
    fn empty_session_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_session(None, &[]).is_err());
        assert_eq!(db.find_session_by_files(&[]).unwrap(), None);
    }

    #[test]
    fn lookup_by_name_and_membership_listing() {
        let db = Database::open_in_memory().unwrap();
        seed_files(&db, &["f1", "f2"]);
        let session = db
            .create_session(Some("papers"), &ids(&["f1", "f2"]))
            .unwrap();

        assert_eq!(db.find_session_by_name("papers").unwrap(), Some(session));
        assert_eq!(db.find_session_by_name("missing").unwrap(), None);

        let files = db.session_files(session).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].id.as_str(), "f1");
    }
}
