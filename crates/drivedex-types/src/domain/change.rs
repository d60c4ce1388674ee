use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cursor::PageToken;
use super::file::FileId;

/// One change-feed event, tagged with the token of the page that carried it.
///
/// Changes have no natural key; `id` is generated at observation time.
/// Reprocessing a page after a crash therefore inserts fresh rows, which is
/// accepted — files and revisions are the deduplicated entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub id: Uuid,
    pub file_id: FileId,
    pub file_name: String,
    pub file_mime_type: String,
    pub time: DateTime<Utc>,
    /// Drive's change classifier ("file" or "drive")
    pub change_type: String,
    pub removed: bool,
    pub page_token: PageToken,
}

impl ChangeEntry {
    pub fn new(
        file_id: impl Into<FileId>,
        file_name: impl Into<String>,
        file_mime_type: impl Into<String>,
        time: DateTime<Utc>,
        change_type: impl Into<String>,
        removed: bool,
        page_token: PageToken,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_id: file_id.into(),
            file_name: file_name.into(),
            file_mime_type: file_mime_type.into(),
            time,
            change_type: change_type.into(),
            removed,
            page_token,
        }
    }
}
