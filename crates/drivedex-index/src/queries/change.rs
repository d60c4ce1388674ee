use rusqlite::{Connection, params};

use drivedex_types::{FileId, now_rfc3339};

use crate::Result;
use crate::records::ChangeRecord;

/// Append change rows. Changes carry a generated UUID, so reprocessing a
/// page inserts fresh rows; `INSERT OR IGNORE` only guards against replaying
/// the exact same record objects.
pub fn insert_many(conn: &Connection, changes: &[ChangeRecord]) -> Result<usize> {
    let now = now_rfc3339();
    let mut inserted = 0usize;

    for change in changes {
        inserted += conn.execute(
            r#"
            INSERT OR IGNORE INTO changes
                (id, file_id, file_name, file_mime_type, time, change_type, removed, page_token, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                &change.id,
                change.file_id.as_str(),
                &change.file_name,
                &change.file_mime_type,
                &change.time,
                &change.change_type,
                change.removed,
                &change.page_token,
                &now
            ],
        )?;
    }

    Ok(inserted)
}

pub fn list(conn: &Connection, limit: Option<usize>) -> Result<Vec<ChangeRecord>> {
    let limit_clause = limit.map(|l| format!("LIMIT {}", l)).unwrap_or_default();
    let query = format!(
        r#"
        SELECT id, file_id, file_name, file_mime_type, time, change_type, removed, page_token
        FROM changes
        ORDER BY time DESC
        {}
        "#,
        limit_clause
    );

    let mut stmt = conn.prepare(&query)?;
    let changes = stmt
        .query_map([], |row| {
            Ok(ChangeRecord {
                id: row.get(0)?,
                file_id: FileId::from(row.get::<_, String>(1)?),
                file_name: row.get(2)?,
                file_mime_type: row.get(3)?,
                time: row.get(4)?,
                change_type: row.get(5)?,
                removed: row.get(6)?,
                page_token: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(changes)
}

pub fn count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM changes", [], |row| row.get(0))?;
    Ok(count as usize)
}
