use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Mime type of exported PDF documents
pub const MIME_PDF: &str = "application/pdf";

/// Mime type of native Google Docs documents
pub const MIME_GOOGLE_DOC: &str = "application/vnd.google-apps.document";

/// Placeholder title Drive assigns to documents that were never renamed.
/// Revision counts on these are noise, so filters exclude them by name.
pub const GOOGLE_DOC_UNTITLED: &str = "Naamloos document";

/// Opaque Drive file identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for FileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether the authenticated account may still fetch a file's metadata.
///
/// Drive answers per-file revision listings with 403 once access is revoked.
/// A file downgraded to `Forbidden` stays excluded from every later fetch
/// attempt until an operator resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    Active,
    Forbidden,
}

impl AccessState {
    pub fn is_forbidden(self) -> bool {
        matches!(self, AccessState::Forbidden)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessState::Active => "active",
            AccessState::Forbidden => "forbidden",
        }
    }
}

impl Default for AccessState {
    fn default() -> Self {
        Self::Active
    }
}

impl FromStr for AccessState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(AccessState::Active),
            "forbidden" => Ok(AccessState::Forbidden),
            other => Err(Error::Parse(format!("unknown access state '{}'", other))),
        }
    }
}

/// File metadata as carried through the sync pipeline.
///
/// This is the in-memory working-set item: produced from change-feed pages,
/// consumed by the revision fetcher, persisted by the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMeta {
    pub id: FileId,
    pub name: String,
    pub mime_type: String,
    /// Reconstructed Drive-side path ("/Books/rust.pdf"), if resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub access: AccessState,
}

impl FileMeta {
    pub fn new(id: impl Into<FileId>, name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            path: None,
            access: AccessState::Active,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == MIME_PDF
    }

    /// Named Google Docs only; untitled placeholders carry no signal.
    pub fn is_named_google_doc(&self) -> bool {
        self.mime_type == MIME_GOOGLE_DOC && self.name != GOOGLE_DOC_UNTITLED
    }
}

/// Mime-based selection of revision-fetch candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFilter {
    Pdf,
    GoogleDocs,
    All,
}

impl FileFilter {
    pub fn matches(self, file: &FileMeta) -> bool {
        match self {
            FileFilter::Pdf => file.is_pdf(),
            FileFilter::GoogleDocs => file.is_named_google_doc(),
            FileFilter::All => file.is_pdf() || file.is_named_google_doc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_state_round_trips_through_str() {
        for state in [AccessState::Active, AccessState::Forbidden] {
            assert_eq!(state.as_str().parse::<AccessState>().unwrap(), state);
        }
        assert!("revoked".parse::<AccessState>().is_err());
    }

    #[test]
    fn filter_excludes_untitled_google_docs() {
        let named = FileMeta::new("f1", "Reading notes", MIME_GOOGLE_DOC);
        let untitled = FileMeta::new("f2", GOOGLE_DOC_UNTITLED, MIME_GOOGLE_DOC);
        let pdf = FileMeta::new("f3", "rust.pdf", MIME_PDF);

        assert!(FileFilter::GoogleDocs.matches(&named));
        assert!(!FileFilter::GoogleDocs.matches(&untitled));
        assert!(!FileFilter::GoogleDocs.matches(&pdf));
        assert!(FileFilter::Pdf.matches(&pdf));
        assert!(FileFilter::All.matches(&named));
        assert!(!FileFilter::All.matches(&untitled));
    }
}
