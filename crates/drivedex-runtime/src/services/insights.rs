//! Revision activity report: which cached files get revised, how often,
//! and over what span. Drive only retains revision history for a limited
//! window, so regular syncs are what make this table meaningful.

use serde::Serialize;

use drivedex_index::Database;
use drivedex_types::parse_rfc3339;

use crate::Result;

#[derive(Debug, Clone, Serialize)]
pub struct RevisionInsight {
    pub file_id: String,
    pub name: String,
    pub mime_type: String,
    pub revision_count: i64,
    pub first_modified: String,
    pub last_modified: String,
    /// Days between first and last revision, when both timestamps parse
    pub span_days: Option<i64>,
}

pub fn revision_report(db: &Database, limit: Option<usize>) -> Result<Vec<RevisionInsight>> {
    let stats = db.revision_stats(limit)?;

    Ok(stats
        .into_iter()
        .map(|s| {
            let span_days = match (
                parse_rfc3339(&s.first_modified),
                parse_rfc3339(&s.last_modified),
            ) {
                (Some(first), Some(last)) => Some((last - first).num_days()),
                _ => None,
            };

            RevisionInsight {
                file_id: s.file_id.to_string(),
                name: s.name,
                mime_type: s.mime_type,
                revision_count: s.revision_count,
                first_modified: s.first_modified,
                last_modified: s.last_modified,
                span_days,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivedex_index::{FileRecord, RevisionRecord};
    use drivedex_types::{AccessState, FileId, MIME_PDF, RevisionId};

    #[test]
    fn report_computes_span() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_file(&FileRecord {
            id: FileId::from("f1"),
            name: "a.pdf".to_string(),
            mime_type: MIME_PDF.to_string(),
            path: None,
            access: AccessState::Active,
        })
        .unwrap();
        db.upsert_revisions(&[
            RevisionRecord {
                id: RevisionId::from("r1"),
                file_id: FileId::from("f1"),
                mime_type: MIME_PDF.to_string(),
                modified_time: "2024-01-01T10:00:00Z".to_string(),
            },
            RevisionRecord {
                id: RevisionId::from("r2"),
                file_id: FileId::from("f1"),
                mime_type: MIME_PDF.to_string(),
                modified_time: "2024-01-11T10:00:00Z".to_string(),
            },
        ])
        .unwrap();

        let report = revision_report(&db, None).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].revision_count, 2);
        assert_eq!(report[0].span_days, Some(10));
    }
}
