//! Per-file revision fetch with a forbidden-file circuit breaker.
//!
//! Drive has no batch endpoint for revisions, so this is one request per
//! file. A failing file is downgraded to `Forbidden` (in the working set and
//! in the cache) and the loop moves on; the rest of the batch is not lost.

use tracing::{debug, info, warn};

use drivedex_api::DriveApi;
use drivedex_index::{Database, RevisionRecord};
use drivedex_types::{
    AccessState, FileId, FileMeta, RevisionId, RevisionMeta, parse_rfc3339,
};

use crate::{Error, Result};

#[derive(Debug)]
pub struct RevisionFetchReport {
    pub revisions: Vec<RevisionMeta>,
    /// Files downgraded during this run
    pub forbidden: Vec<FileId>,
    /// Files that entered the run already forbidden and were not attempted
    pub skipped_forbidden: usize,
    pub upserted: usize,
}

pub struct RevisionService<'a, A: DriveApi + ?Sized> {
    api: &'a A,
    db: &'a Database,
}

impl<'a, A: DriveApi + ?Sized> RevisionService<'a, A> {
    pub fn new(api: &'a A, db: &'a Database) -> Self {
        Self { api, db }
    }

    /// Fetch revisions for every active file in `files`, downgrading failing
    /// files in place. With `push`, fetched revisions are upserted; their
    /// file rows must already exist in the cache.
    pub fn fetch(&self, files: &mut [FileMeta], push: bool) -> Result<RevisionFetchReport> {
        let mut revisions: Vec<RevisionMeta> = Vec::new();
        let mut forbidden: Vec<FileId> = Vec::new();
        let mut skipped_forbidden = 0usize;

        info!(files = files.len(), "fetching revisions per file");

        for file in files.iter_mut() {
            if file.access.is_forbidden() {
                debug!(file_id = %file.id, "skipping forbidden file");
                skipped_forbidden += 1;
                continue;
            }

            let list = match self.api.list_revisions(&file.id) {
                Ok(list) => list,
                Err(err) => {
                    warn!(file_id = %file.id, error = %err, "revision fetch failed; marking file forbidden");
                    file.access = AccessState::Forbidden;
                    self.db.set_file_access(&file.id, AccessState::Forbidden)?;
                    forbidden.push(file.id.clone());
                    continue;
                }
            };

            for revision in list.revisions {
                let modified_time = parse_rfc3339(&revision.modified_time).ok_or_else(|| {
                    Error::Api(drivedex_api::Error::Shape(format!(
                        "revision {} of file {} has unparseable modifiedTime '{}'",
                        revision.id, file.id, revision.modified_time
                    )))
                })?;

                revisions.push(RevisionMeta {
                    id: RevisionId::from(revision.id),
                    file_id: file.id.clone(),
                    mime_type: revision.mime_type,
                    modified_time,
                });
            }
        }

        let upserted = if push {
            let records: Vec<RevisionRecord> =
                revisions.iter().map(RevisionRecord::from).collect();
            self.db.upsert_revisions(&records)?
        } else {
            0
        };

        if !forbidden.is_empty() {
            info!(count = forbidden.len(), "files marked forbidden this run");
        }

        Ok(RevisionFetchReport {
            revisions,
            forbidden,
            skipped_forbidden,
            upserted,
        })
    }
}
