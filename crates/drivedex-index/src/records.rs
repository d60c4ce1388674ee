use drivedex_types::{
    AccessState, ChangeEntry, CursorScope, FileId, FileMeta, PageToken, RevisionId, RevisionMeta,
    to_rfc3339,
};

/// File row in the cache.
///
/// `access` is sticky: once a row is forbidden, later upserts keep it
/// forbidden until an operator resets it.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: FileId,
    pub name: String,
    pub mime_type: String,
    /// Reconstructed Drive-side path, if resolved
    pub path: Option<String>,
    pub access: AccessState,
}

impl From<&FileMeta> for FileRecord {
    fn from(meta: &FileMeta) -> Self {
        Self {
            id: meta.id.clone(),
            name: meta.name.clone(),
            mime_type: meta.mime_type.clone(),
            path: meta.path.clone(),
            access: meta.access,
        }
    }
}

impl FileRecord {
    pub fn to_meta(&self) -> FileMeta {
        FileMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            path: self.path.clone(),
            access: self.access,
        }
    }
}

/// Change row. No natural key; the UUID is generated at observation time and
/// reprocessed pages insert fresh rows.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    pub id: String,
    pub file_id: FileId,
    pub file_name: String,
    pub file_mime_type: String,
    pub time: String,
    pub change_type: String,
    pub removed: bool,
    pub page_token: String,
}

impl From<&ChangeEntry> for ChangeRecord {
    fn from(entry: &ChangeEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            file_id: entry.file_id.clone(),
            file_name: entry.file_name.clone(),
            file_mime_type: entry.file_mime_type.clone(),
            time: to_rfc3339(&entry.time),
            change_type: entry.change_type.clone(),
            removed: entry.removed,
            page_token: entry.page_token.to_string(),
        }
    }
}

/// Revision row, unique by Drive revision id. The owning file row must exist
/// first.
#[derive(Debug, Clone)]
pub struct RevisionRecord {
    pub id: RevisionId,
    pub file_id: FileId,
    pub mime_type: String,
    pub modified_time: String,
}

impl From<&RevisionMeta> for RevisionRecord {
    fn from(meta: &RevisionMeta) -> Self {
        Self {
            id: meta.id.clone(),
            file_id: meta.file_id.clone(),
            mime_type: meta.mime_type.clone(),
            modified_time: to_rfc3339(&meta.modified_time),
        }
    }
}

/// Stored resume cursor for one feed
#[derive(Debug, Clone)]
pub struct CursorRecord {
    pub scope: CursorScope,
    pub value: PageToken,
    pub updated_at: String,
}

/// Session listing row
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionSummary {
    pub id: i64,
    pub name: Option<String>,
    /// How often this exact file set was reopened
    pub nused: i64,
    pub file_count: i64,
    pub updated_at: String,
}

/// Per-file revision aggregation for the insights report
#[derive(Debug, Clone, serde::Serialize)]
pub struct RevisionFileStats {
    pub file_id: FileId,
    pub name: String,
    pub mime_type: String,
    pub revision_count: i64,
    pub first_modified: String,
    pub last_modified: String,
}
