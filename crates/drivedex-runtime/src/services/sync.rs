//! One polling cycle against the change feed.
//!
//! Picks a start token (explicit, stored cursor, or a fresh head-of-feed
//! token), walks the feed, persists what came back, and stores the resume
//! cursor the walk outcome dictates. Safe to repeat with overlapping pages:
//! files upsert by id, only change rows (no natural key) append.

use std::collections::HashMap;

use tracing::{info, warn};

use drivedex_api::{DriveApi, walk_changes, walk_files};
use drivedex_index::{ChangeRecord, Database, FileRecord};
use drivedex_types::{ChangeEntry, CursorScope, FileMeta, PageToken, ResumePolicy};

use crate::Result;

pub struct SyncRequest {
    /// Explicit start token; falls back to the stored cursor, then to the
    /// API's current head-of-feed token
    pub start_token: Option<PageToken>,
    pub max_pages: Option<usize>,
    pub resume_policy: ResumePolicy,
    /// Write fetched rows to the cache; the cursor is persisted either way
    pub push: bool,
}

pub struct SyncReport {
    pub start_token: PageToken,
    pub files: Vec<FileRecord>,
    pub changes: Vec<ChangeRecord>,
    pub files_upserted: usize,
    pub changes_inserted: usize,
    /// Cursor persisted for the next run; `None` means it was cleared and
    /// the operator must pick a fresh start token
    pub resume_token: Option<PageToken>,
    /// Set when the walk aborted early; accumulated rows are still persisted
    pub error: Option<String>,
}

impl SyncReport {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

pub struct SyncService<'a, A: DriveApi + ?Sized> {
    api: &'a A,
    db: &'a Database,
}

impl<'a, A: DriveApi + ?Sized> SyncService<'a, A> {
    pub fn new(api: &'a A, db: &'a Database) -> Self {
        Self { api, db }
    }

    pub fn run(&self, request: &SyncRequest) -> Result<SyncReport> {
        let start = self.resolve_start_token(request.start_token.clone())?;
        info!(start = %start, max_pages = ?request.max_pages, "walking change feed");

        let walk = walk_changes(self.api, start.clone(), request.max_pages);
        let error = walk.error().map(|e| e.to_string());
        let resume_token = walk.resume_token(request.resume_policy);
        let entries = walk.into_items();

        let files = collect_files(&entries);
        let changes: Vec<ChangeRecord> = entries.iter().map(ChangeRecord::from).collect();

        let mut report = SyncReport {
            start_token: start,
            files,
            changes,
            files_upserted: 0,
            changes_inserted: 0,
            resume_token: resume_token.clone(),
            error,
        };

        if request.push {
            // files first: change rows reference them
            report.files_upserted = self.db.upsert_files(&report.files)?;
            report.changes_inserted = self.db.insert_changes(&report.changes)?;
            info!(
                files = report.files_upserted,
                changes = report.changes_inserted,
                "persisted change-feed batch"
            );
        }

        match &resume_token {
            Some(token) => self.db.set_cursor(CursorScope::Change, token)?,
            None => {
                warn!("walk failed with discard policy; clearing stored cursor");
                self.db.clear_cursor(CursorScope::Change)?;
            }
        }

        Ok(report)
    }

    /// Walk the file listing instead of the change feed. The listing has no
    /// terminal resume token, so a drained walk clears the continuation
    /// cursor; a budgeted walk stores where to pick up.
    pub fn run_file_listing(&self, request: &SyncRequest) -> Result<FileListingReport> {
        let start = self.resolve_file_start_token(request.start_token.clone())?;
        info!(start = %start, max_pages = ?request.max_pages, "walking file listing");

        let walk = walk_files(self.api, start.clone(), request.max_pages);
        let error = walk.error().map(|e| e.to_string());
        let resume_token = walk.resume_token(request.resume_policy);

        let files: Vec<FileRecord> = walk.into_items().iter().map(FileRecord::from).collect();

        let mut report = FileListingReport {
            start_token: start,
            files,
            upserted: 0,
            resume_token: resume_token.clone(),
            error,
        };

        if request.push {
            report.upserted = self.db.upsert_files(&report.files)?;
            info!(files = report.upserted, "persisted file listing batch");
        }

        match &resume_token {
            Some(token) => self.db.set_cursor(CursorScope::File, token)?,
            None => self.db.clear_cursor(CursorScope::File)?,
        }

        Ok(report)
    }

    fn resolve_start_token(&self, explicit: Option<PageToken>) -> Result<PageToken> {
        if let Some(token) = explicit {
            return Ok(token);
        }

        if let Some(cursor) = self.db.current_cursor(CursorScope::Change)? {
            return Ok(cursor.value);
        }

        info!("no stored cursor; requesting fresh start token");
        Ok(self.api.start_page_token()?)
    }

    /// The file listing resumes from its own cursor, falls back to the
    /// change-feed cursor, then to a fresh token.
    fn resolve_file_start_token(&self, explicit: Option<PageToken>) -> Result<PageToken> {
        if let Some(token) = explicit {
            return Ok(token);
        }

        if let Some(cursor) = self.db.current_cursor(CursorScope::File)? {
            return Ok(cursor.value);
        }

        if let Some(cursor) = self.db.current_cursor(CursorScope::Change)? {
            return Ok(cursor.value);
        }

        info!("no stored cursor; requesting fresh start token");
        Ok(self.api.start_page_token()?)
    }
}

pub struct FileListingReport {
    pub start_token: PageToken,
    pub files: Vec<FileRecord>,
    pub upserted: usize,
    /// Continuation cursor for a budgeted walk; `None` once the listing is
    /// complete (the files feed has no terminal resume token)
    pub resume_token: Option<PageToken>,
    pub error: Option<String>,
}

impl FileListingReport {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Reduce change entries to their file working set, deduplicated by id.
/// The last occurrence wins: later pages carry newer metadata.
fn collect_files(entries: &[ChangeEntry]) -> Vec<FileRecord> {
    let mut order: Vec<&drivedex_types::FileId> = Vec::new();
    let mut latest: HashMap<&drivedex_types::FileId, FileMeta> = HashMap::new();

    for entry in entries {
        let meta = FileMeta::new(
            entry.file_id.clone(),
            entry.file_name.clone(),
            entry.file_mime_type.clone(),
        );
        if latest.insert(&entry.file_id, meta).is_none() {
            order.push(&entry.file_id);
        }
    }

    order
        .into_iter()
        .map(|id| FileRecord::from(&latest[id]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivedex_api::wire::{ChangeList, FileFields, FileList, RevisionList, WireChange, WireFile};
    use drivedex_types::FileId;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Scripted change feed keyed by page token
    struct FakeDrive {
        start_token: &'static str,
        pages: HashMap<&'static str, ChangeList>,
        file_pages: HashMap<&'static str, FileList>,
        failing: Vec<&'static str>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeDrive {
        fn page(
            changes: Vec<(&str, &str)>,
            next: Option<&str>,
            new_start: Option<&str>,
        ) -> ChangeList {
            ChangeList {
                changes: changes
                    .into_iter()
                    .map(|(id, name)| WireChange {
                        change_type: Some("file".to_string()),
                        time: Some("2024-01-01T10:00:00Z".to_string()),
                        removed: false,
                        file_id: Some(id.to_string()),
                        file: Some(WireFile {
                            id: id.to_string(),
                            name: name.to_string(),
                            mime_type: "application/pdf".to_string(),
                        }),
                    })
                    .collect(),
                next_page_token: next.map(String::from),
                new_start_page_token: new_start.map(String::from),
            }
        }
    }

    impl DriveApi for FakeDrive {
        fn start_page_token(&self) -> drivedex_api::Result<PageToken> {
            Ok(PageToken::from(self.start_token))
        }

        fn list_changes(&self, page_token: &PageToken) -> drivedex_api::Result<ChangeList> {
            self.requested.borrow_mut().push(page_token.to_string());
            if self.failing.contains(&page_token.as_str()) {
                return Err(drivedex_api::Error::Api {
                    status: 500,
                    message: "scripted failure".to_string(),
                });
            }
            self.pages
                .get(page_token.as_str())
                .cloned()
                .ok_or_else(|| drivedex_api::Error::Api {
                    status: 404,
                    message: format!("no page {}", page_token),
                })
        }

        fn list_files(&self, page_token: Option<&PageToken>) -> drivedex_api::Result<FileList> {
            let token = page_token.expect("file walks always carry a token");
            self.requested.borrow_mut().push(token.to_string());
            self.file_pages
                .get(token.as_str())
                .cloned()
                .ok_or_else(|| drivedex_api::Error::Api {
                    status: 404,
                    message: format!("no file page {}", token),
                })
        }

        fn list_revisions(&self, _file_id: &FileId) -> drivedex_api::Result<RevisionList> {
            unimplemented!()
        }

        fn file_fields(&self, _file_id: &FileId) -> drivedex_api::Result<FileFields> {
            unimplemented!()
        }
    }

    fn file_page(files: Vec<(&str, &str)>, next: Option<&str>) -> FileList {
        FileList {
            files: files
                .into_iter()
                .map(|(id, name)| WireFile {
                    id: id.to_string(),
                    name: name.to_string(),
                    mime_type: "application/pdf".to_string(),
                })
                .collect(),
            next_page_token: next.map(String::from),
        }
    }

    fn two_page_drive() -> FakeDrive {
        FakeDrive {
            start_token: "100",
            pages: HashMap::from([
                (
                    "100",
                    FakeDrive::page(vec![("f1", "a.pdf"), ("f2", "b.pdf")], Some("200"), None),
                ),
                (
                    "200",
                    FakeDrive::page(vec![("f1", "a renamed.pdf")], None, Some("300")),
                ),
                ("300", FakeDrive::page(vec![], None, Some("300"))),
            ]),
            file_pages: HashMap::from([
                ("100", file_page(vec![("f7", "old.pdf"), ("f8", "notes.pdf")], Some("150"))),
                ("150", file_page(vec![("f9", "paper.pdf")], None)),
            ]),
            failing: Vec::new(),
            requested: RefCell::new(Vec::new()),
        }
    }

    fn request() -> SyncRequest {
        SyncRequest {
            start_token: None,
            max_pages: None,
            resume_policy: ResumePolicy::KeepLastSeen,
            push: true,
        }
    }

    #[test]
    fn full_walk_persists_rows_and_cursor() {
        let drive = two_page_drive();
        let db = Database::open_in_memory().unwrap();

        let report = SyncService::new(&drive, &db).run(&request()).unwrap();

        assert!(!report.is_failed());
        assert_eq!(report.changes.len(), 3);
        // f1 deduplicated; later page wins
        assert_eq!(report.files.len(), 2);
        assert_eq!(db.count_files().unwrap(), 2);
        assert_eq!(db.count_changes().unwrap(), 3);
        assert_eq!(
            db.get_file(&FileId::from("f1")).unwrap().unwrap().name,
            "a renamed.pdf"
        );

        let cursor = db.current_cursor(CursorScope::Change).unwrap().unwrap();
        assert_eq!(cursor.value.as_str(), "300");
    }

    #[test]
    fn second_run_resumes_from_stored_cursor_and_stays_idempotent() {
        let drive = two_page_drive();
        let db = Database::open_in_memory().unwrap();
        let service = SyncService::new(&drive, &db);

        service.run(&request()).unwrap();
        let files_before = db.count_files().unwrap();

        let report = service.run(&request()).unwrap();

        // resumed from the persisted "300" cursor, which serves an empty page
        assert_eq!(report.start_token.as_str(), "300");
        assert_eq!(report.changes.len(), 0);
        assert_eq!(db.count_files().unwrap(), files_before);
    }

    #[test]
    fn refetching_same_pages_never_duplicates_files() {
        let drive = two_page_drive();
        let db = Database::open_in_memory().unwrap();
        let service = SyncService::new(&drive, &db);

        let explicit = SyncRequest {
            start_token: Some(PageToken::from("100")),
            ..request()
        };

        service.run(&explicit).unwrap();
        let files_once = db.count_files().unwrap();
        service.run(&explicit).unwrap();

        assert_eq!(db.count_files().unwrap(), files_once);
    }

    #[test]
    fn failed_walk_keeps_partial_rows_and_applies_keep_policy() {
        let mut drive = two_page_drive();
        drive.failing.push("200");
        let db = Database::open_in_memory().unwrap();

        let report = SyncService::new(&drive, &db).run(&request()).unwrap();

        assert!(report.is_failed());
        // page "100" rows survived the abort
        assert_eq!(db.count_files().unwrap(), 2);
        let cursor = db.current_cursor(CursorScope::Change).unwrap().unwrap();
        assert_eq!(cursor.value.as_str(), "100");
    }

    #[test]
    fn failed_walk_with_discard_policy_clears_cursor() {
        let mut drive = two_page_drive();
        drive.failing.push("200");
        let db = Database::open_in_memory().unwrap();
        db.set_cursor(CursorScope::Change, &PageToken::from("100"))
            .unwrap();

        let discard = SyncRequest {
            resume_policy: ResumePolicy::Discard,
            ..request()
        };
        let report = SyncService::new(&drive, &db).run(&discard).unwrap();

        assert!(report.is_failed());
        assert!(report.resume_token.is_none());
        assert!(db.current_cursor(CursorScope::Change).unwrap().is_none());
    }

    #[test]
    fn page_budget_persists_continuation_cursor() {
        let drive = two_page_drive();
        let db = Database::open_in_memory().unwrap();

        let budgeted = SyncRequest {
            max_pages: Some(1),
            ..request()
        };
        let report = SyncService::new(&drive, &db).run(&budgeted).unwrap();

        assert!(!report.is_failed());
        assert_eq!(report.changes.len(), 2);
        let cursor = db.current_cursor(CursorScope::Change).unwrap().unwrap();
        assert_eq!(cursor.value.as_str(), "200");
    }

    #[test]
    fn file_listing_upserts_and_clears_continuation_cursor() {
        let drive = two_page_drive();
        let db = Database::open_in_memory().unwrap();

        let explicit = SyncRequest {
            start_token: Some(PageToken::from("100")),
            ..request()
        };
        let report = SyncService::new(&drive, &db)
            .run_file_listing(&explicit)
            .unwrap();

        assert!(!report.is_failed());
        assert_eq!(report.files.len(), 3);
        assert_eq!(report.upserted, 3);
        assert_eq!(db.count_files().unwrap(), 3);
        // drained listing has no resume point
        assert!(report.resume_token.is_none());
        assert!(db.current_cursor(CursorScope::File).unwrap().is_none());
    }

    #[test]
    fn budgeted_file_listing_stores_continuation_cursor() {
        let drive = two_page_drive();
        let db = Database::open_in_memory().unwrap();
        let service = SyncService::new(&drive, &db);

        let budgeted = SyncRequest {
            start_token: Some(PageToken::from("100")),
            max_pages: Some(1),
            ..request()
        };
        let report = service.run_file_listing(&budgeted).unwrap();

        assert_eq!(report.files.len(), 2);
        let cursor = db.current_cursor(CursorScope::File).unwrap().unwrap();
        assert_eq!(cursor.value.as_str(), "150");

        // next run without an explicit token picks up the continuation
        let resumed = service
            .run_file_listing(&SyncRequest {
                start_token: None,
                ..request()
            })
            .unwrap();
        assert_eq!(resumed.start_token.as_str(), "150");
        assert_eq!(db.count_files().unwrap(), 3);
    }

    #[test]
    fn file_listing_falls_back_to_change_cursor() {
        let drive = two_page_drive();
        let db = Database::open_in_memory().unwrap();
        db.set_cursor(CursorScope::Change, &PageToken::from("150"))
            .unwrap();

        let report = SyncService::new(&drive, &db)
            .run_file_listing(&request())
            .unwrap();

        assert_eq!(report.start_token.as_str(), "150");
        assert_eq!(report.files.len(), 1);
    }

    #[test]
    fn push_false_fetches_without_writing_rows() {
        let drive = two_page_drive();
        let db = Database::open_in_memory().unwrap();

        let fetch_only = SyncRequest {
            push: false,
            ..request()
        };
        let report = SyncService::new(&drive, &db).run(&fetch_only).unwrap();

        assert_eq!(report.changes.len(), 3);
        assert_eq!(db.count_files().unwrap(), 0);
        assert_eq!(db.count_changes().unwrap(), 0);
        // the cursor still advances; snapshots may hold the fetched rows
        assert!(db.current_cursor(CursorScope::Change).unwrap().is_some());
    }
}
