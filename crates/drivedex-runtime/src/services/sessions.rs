//! Reading-session bookkeeping and viewer fan-out.
//!
//! A session is the exact set of files the user opened together. Reopening
//! the same set reuses the stored session and bumps its use counter; any
//! other set (overlap included) is a new session.

use std::process::{Child, Command};

use tracing::{info, warn};

use drivedex_index::{Database, FileRecord, SessionSummary};
use drivedex_types::FileId;

use crate::{Error, Result};

#[derive(Debug)]
pub struct OpenPlan {
    pub session_id: i64,
    /// An existing session with this exact file set was reused
    pub reused: bool,
    pub files: Vec<FileRecord>,
}

pub struct OpenReport {
    pub spawned: usize,
    pub succeeded: usize,
    pub failures: Vec<String>,
    /// Members without a reconstructed path cannot be opened locally
    pub skipped_no_path: Vec<FileId>,
}

pub struct SessionService<'a> {
    db: &'a Database,
}

impl<'a> SessionService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn list(&self, limit: Option<usize>) -> Result<Vec<SessionSummary>> {
        Ok(self.db.list_sessions(limit)?)
    }

    /// Resolve an ad-hoc file set to a session: exact-set reuse or create.
    /// Either way the session's use counter is bumped, since the caller is
    /// about to open it.
    pub fn plan_open_set(&self, name: Option<&str>, file_ids: &[FileId]) -> Result<OpenPlan> {
        for id in file_ids {
            if self.db.get_file(id)?.is_none() {
                return Err(Error::InvalidOperation(format!(
                    "unknown file id '{}'; sync first",
                    id
                )));
            }
        }

        let (session_id, reused) = match self.db.find_session_by_files(file_ids)? {
            Some(id) => {
                info!(session_id = id, "reusing session with identical file set");
                (id, true)
            }
            None => {
                let id = self.db.create_session(name, file_ids)?;
                info!(session_id = id, files = file_ids.len(), "created new session");
                (id, false)
            }
        };

        self.db.touch_session(session_id)?;
        let files = self.db.session_files(session_id)?;

        Ok(OpenPlan {
            session_id,
            reused,
            files,
        })
    }

    /// Resolve a stored session by numeric id or name
    pub fn plan_open_session(&self, selector: &str) -> Result<OpenPlan> {
        let session_id = self.resolve_selector(selector)?;
        self.db.touch_session(session_id)?;
        let files = self.db.session_files(session_id)?;

        Ok(OpenPlan {
            session_id,
            reused: true,
            files,
        })
    }

    fn resolve_selector(&self, selector: &str) -> Result<i64> {
        if let Ok(id) = selector.parse::<i64>()
            && self.db.get_session(id)?.is_some()
        {
            return Ok(id);
        }

        self.db
            .find_session_by_name(selector)?
            .ok_or_else(|| Error::InvalidOperation(format!("no session '{}'", selector)))
    }

    /// Spawn one viewer process per file, then wait for all of them.
    /// Fan-out/join only: no ordering among viewers, no cancellation.
    pub fn open_files(
        &self,
        files: &[FileRecord],
        viewer: &str,
        mount_prefix: &str,
    ) -> Result<OpenReport> {
        let mut children: Vec<(FileId, Child)> = Vec::new();
        let mut failures = Vec::new();
        let mut skipped_no_path = Vec::new();

        for file in files {
            let Some(path) = &file.path else {
                warn!(file_id = %file.id, "no reconstructed path; cannot open");
                skipped_no_path.push(file.id.clone());
                continue;
            };

            let full_path = format!("{}{}", mount_prefix, path);
            match Command::new(viewer).arg(&full_path).spawn() {
                Ok(child) => {
                    info!(file_id = %file.id, path = %full_path, "opened viewer");
                    children.push((file.id.clone(), child));
                }
                Err(err) => {
                    failures.push(format!("{}: failed to spawn {}: {}", file.id, viewer, err));
                }
            }
        }

        let spawned = children.len();
        let mut succeeded = 0usize;

        for (file_id, mut child) in children {
            match child.wait() {
                Ok(status) if status.success() => succeeded += 1,
                Ok(status) => failures.push(format!("{}: viewer exited with {}", file_id, status)),
                Err(err) => failures.push(format!("{}: wait failed: {}", file_id, err)),
            }
        }

        Ok(OpenReport {
            spawned,
            succeeded,
            failures,
            skipped_no_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivedex_types::{AccessState, MIME_PDF};

    fn seed(db: &Database, ids: &[&str]) {
        let records: Vec<FileRecord> = ids
            .iter()
            .map(|id| FileRecord {
                id: FileId::from(*id),
                name: format!("{}.pdf", id),
                mime_type: MIME_PDF.to_string(),
                path: Some(format!("/Books/{}.pdf", id)),
                access: AccessState::Active,
            })
            .collect();
        db.upsert_files(&records).unwrap();
    }

    fn ids(raw: &[&str]) -> Vec<FileId> {
        raw.iter().map(|s| FileId::from(*s)).collect()
    }

    #[test]
    fn same_set_reuses_and_counts_uses() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, &["f1", "f2"]);
        let service = SessionService::new(&db);

        let first = service.plan_open_set(None, &ids(&["f1", "f2"])).unwrap();
        assert!(!first.reused);

        let second = service.plan_open_set(None, &ids(&["f2", "f1"])).unwrap();
        assert!(second.reused);
        assert_eq!(second.session_id, first.session_id);

        let summary = db.get_session(first.session_id).unwrap().unwrap();
        assert_eq!(summary.nused, 2);
    }

    #[test]
    fn different_set_creates_new_session() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, &["f1", "f2", "f3"]);
        let service = SessionService::new(&db);

        let first = service.plan_open_set(None, &ids(&["f1", "f2"])).unwrap();
        let overlap = service.plan_open_set(None, &ids(&["f1", "f3"])).unwrap();

        assert_ne!(first.session_id, overlap.session_id);
        assert!(!overlap.reused);
    }

    #[test]
    fn unknown_file_id_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, &["f1"]);
        let service = SessionService::new(&db);

        let err = service
            .plan_open_set(None, &ids(&["f1", "ghost"]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }

    #[test]
    fn selector_resolves_id_then_name() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, &["f1", "f2"]);
        let service = SessionService::new(&db);

        let plan = service
            .plan_open_set(Some("papers"), &ids(&["f1", "f2"]))
            .unwrap();

        let by_id = service
            .plan_open_session(&plan.session_id.to_string())
            .unwrap();
        assert_eq!(by_id.session_id, plan.session_id);

        let by_name = service.plan_open_session("papers").unwrap();
        assert_eq!(by_name.session_id, plan.session_id);

        assert!(service.plan_open_session("missing").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn open_files_waits_for_all_viewers() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, &["f1", "f2"]);
        let service = SessionService::new(&db);
        let files = db.list_files(None, false).unwrap();

        // `true` exits 0 regardless of the path argument
        let report = service.open_files(&files, "true", "/mnt/gdrive").unwrap();

        assert_eq!(report.spawned, 2);
        assert_eq!(report.succeeded, 2);
        assert!(report.failures.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn pathless_files_are_skipped() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_file(&FileRecord {
            id: FileId::from("f1"),
            name: "a.pdf".to_string(),
            mime_type: MIME_PDF.to_string(),
            path: None,
            access: AccessState::Active,
        })
        .unwrap();
        let service = SessionService::new(&db);
        let files = db.list_files(None, false).unwrap();

        let report = service.open_files(&files, "true", "").unwrap();

        assert_eq!(report.spawned, 0);
        assert_eq!(report.skipped_no_path, vec![FileId::from("f1")]);
    }

    #[test]
    fn missing_viewer_is_reported_not_fatal() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, &["f1"]);
        let service = SessionService::new(&db);
        let files = db.list_files(None, false).unwrap();

        let report = service
            .open_files(&files, "drivedex-no-such-viewer", "")
            .unwrap();

        assert_eq!(report.spawned, 0);
        assert_eq!(report.failures.len(), 1);
    }
}
