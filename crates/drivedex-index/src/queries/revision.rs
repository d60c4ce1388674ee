use rusqlite::{Connection, params};

use drivedex_types::{FileId, RevisionId, now_rfc3339};

use crate::Result;
use crate::records::{RevisionFileStats, RevisionRecord};

/// Upsert one revision row keyed by its Drive revision id.
///
/// The owning file row must exist; the foreign key rejects orphans.
pub fn insert_or_update(conn: &Connection, revision: &RevisionRecord) -> Result<()> {
    let now = now_rfc3339();
    conn.execute(
        r#"
        INSERT INTO revisions (id, file_id, mime_type, modified_time, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        ON CONFLICT(id) DO UPDATE SET
            file_id = ?2,
            mime_type = ?3,
            modified_time = ?4,
            updated_at = ?5
        "#,
        params![
            revision.id.as_str(),
            revision.file_id.as_str(),
            &revision.mime_type,
            &revision.modified_time,
            &now
        ],
    )?;

    Ok(())
}

pub fn upsert_many(conn: &Connection, revisions: &[RevisionRecord]) -> Result<usize> {
    for revision in revisions {
        insert_or_update(conn, revision)?;
    }
    Ok(revisions.len())
}

pub fn list(conn: &Connection, limit: Option<usize>) -> Result<Vec<RevisionRecord>> {
    let limit_clause = limit.map(|l| format!("LIMIT {}", l)).unwrap_or_default();
    let query = format!(
        r#"
        SELECT id, file_id, mime_type, modified_time
        FROM revisions
        ORDER BY modified_time DESC
        {}
        "#,
        limit_clause
    );

    let mut stmt = conn.prepare(&query)?;
    let revisions = stmt
        .query_map([], |row| {
            Ok(RevisionRecord {
                id: RevisionId::from(row.get::<_, String>(0)?),
                file_id: FileId::from(row.get::<_, String>(1)?),
                mime_type: row.get(2)?,
                modified_time: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(revisions)
}

pub fn count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM revisions", [], |row| row.get(0))?;
    Ok(count as usize)
}

/// Per-file aggregation behind `revisions stats`: how often each file was
/// revised and over what span. Busiest files last so they end up at the
/// bottom of a terminal listing.
pub fn stats_by_file(conn: &Connection, limit: Option<usize>) -> Result<Vec<RevisionFileStats>> {
    let limit_clause = limit.map(|l| format!("LIMIT {}", l)).unwrap_or_default();
    let query = format!(
        r#"
        SELECT r.file_id,
               f.name,
               f.mime_type,
               COUNT(*) AS revision_count,
               MIN(r.modified_time) AS first_modified,
               MAX(r.modified_time) AS last_modified
        FROM revisions r
        JOIN files f ON f.id = r.file_id
        GROUP BY r.file_id
        ORDER BY revision_count ASC, last_modified DESC
        {}
        "#,
        limit_clause
    );

    let mut stmt = conn.prepare(&query)?;
    let stats = stmt
        .query_map([], |row| {
            Ok(RevisionFileStats {
                file_id: FileId::from(row.get::<_, String>(0)?),
                name: row.get(1)?,
                mime_type: row.get(2)?,
                revision_count: row.get(3)?,
                first_modified: row.get(4)?,
                last_modified: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use crate::records::{FileRecord, RevisionRecord};
    use drivedex_types::{AccessState, FileId, MIME_PDF, RevisionId};

    fn file(id: &str) -> FileRecord {
        FileRecord {
            id: FileId::from(id),
            name: format!("{}.pdf", id),
            mime_type: MIME_PDF.to_string(),
            path: None,
            access: AccessState::Active,
        }
    }

    fn revision(id: &str, file_id: &str, modified: &str) -> RevisionRecord {
        RevisionRecord {
            id: RevisionId::from(id),
            file_id: FileId::from(file_id),
            mime_type: MIME_PDF.to_string(),
            modified_time: modified.to_string(),
        }
    }

    #[test]
    fn upsert_twice_keeps_row_count() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_files(&[file("f1")]).unwrap();

        let batch = vec![
            revision("r1", "f1", "2024-01-01T10:00:00Z"),
            revision("r2", "f1", "2024-01-02T10:00:00Z"),
        ];

        db.upsert_revisions(&batch).unwrap();
        assert_eq!(db.count_revisions().unwrap(), 2);

        db.upsert_revisions(&batch).unwrap();
        assert_eq!(db.count_revisions().unwrap(), 2);
    }

    #[test]
    fn stats_aggregate_per_file() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_files(&[file("f1"), file("f2")]).unwrap();
        db.upsert_revisions(&[
            revision("r1", "f1", "2024-01-01T10:00:00Z"),
            revision("r2", "f1", "2024-01-05T10:00:00Z"),
            revision("r3", "f2", "2024-01-03T10:00:00Z"),
        ])
        .unwrap();

        let stats = db.revision_stats(None).unwrap();
        assert_eq!(stats.len(), 2);

        // ascending by count: f2 first, f1 last
        assert_eq!(stats[0].file_id.as_str(), "f2");
        assert_eq!(stats[1].file_id.as_str(), "f1");
        assert_eq!(stats[1].revision_count, 2);
        assert_eq!(stats[1].first_modified, "2024-01-01T10:00:00Z");
        assert_eq!(stats[1].last_modified, "2024-01-05T10:00:00Z");
    }
}
