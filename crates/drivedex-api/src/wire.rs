//! Raw Drive v3 response payloads.
//!
//! Shapes follow the v3 REST reference; only the fields the pipeline reads
//! are modeled, everything else is ignored on deserialize.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
}

/// Entry of `changes.list`. `file` is absent for entries the account can no
/// longer see (including removals), so it stays optional here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireChange {
    #[serde(default)]
    pub change_type: Option<String>,
    pub time: Option<String>,
    #[serde(default)]
    pub removed: bool,
    pub file_id: Option<String>,
    pub file: Option<WireFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeList {
    #[serde(default)]
    pub changes: Vec<WireChange>,
    pub next_page_token: Option<String>,
    /// Only present on the terminal page of a walk
    pub new_start_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<WireFile>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRevision {
    pub id: String,
    pub mime_type: String,
    pub modified_time: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionList {
    #[serde(default)]
    pub revisions: Vec<WireRevision>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPageTokenResponse {
    pub start_page_token: String,
}

/// Partial `files.get` response used for parent-path reconstruction
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFields {
    pub name: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
}
