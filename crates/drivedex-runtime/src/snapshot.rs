//! Wholesale CSV snapshots of the cache, one file per entity.
//!
//! Snapshots are a convenience export the user can reload or inspect with
//! other tools; there is no incremental append format. Each save rewrites
//! the whole file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use drivedex_index::{ChangeRecord, FileRecord, RevisionRecord};
use drivedex_types::{AccessState, FileId, RevisionId};

use crate::Result;

const FILES_SNAPSHOT: &str = "files.csv";
const CHANGES_SNAPSHOT: &str = "changes.csv";
const REVISIONS_SNAPSHOT: &str = "revisions.csv";

/// Flat CSV row shapes; record types stay free of serde derives
#[derive(Debug, Serialize, Deserialize)]
struct FileRow {
    id: String,
    name: String,
    mime_type: String,
    path: Option<String>,
    access: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChangeRow {
    id: String,
    file_id: String,
    file_name: String,
    file_mime_type: String,
    time: String,
    change_type: String,
    removed: bool,
    page_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RevisionRow {
    id: String,
    file_id: String,
    mime_type: String,
    modified_time: String,
}

pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_files(&self, files: &[FileRecord]) -> Result<PathBuf> {
        let rows = files.iter().map(|f| FileRow {
            id: f.id.to_string(),
            name: f.name.clone(),
            mime_type: f.mime_type.clone(),
            path: f.path.clone(),
            access: f.access.as_str().to_string(),
        });
        self.write_rows(FILES_SNAPSHOT, rows)
    }

    pub fn load_files(&self) -> Result<Vec<FileRecord>> {
        let rows: Vec<FileRow> = self.read_rows(FILES_SNAPSHOT)?;
        Ok(rows
            .into_iter()
            .map(|row| FileRecord {
                id: FileId::from(row.id),
                name: row.name,
                mime_type: row.mime_type,
                path: row.path,
                access: AccessState::from_str(&row.access).unwrap_or_default(),
            })
            .collect())
    }

    pub fn save_changes(&self, changes: &[ChangeRecord]) -> Result<PathBuf> {
        let rows = changes.iter().map(|c| ChangeRow {
            id: c.id.clone(),
            file_id: c.file_id.to_string(),
            file_name: c.file_name.clone(),
            file_mime_type: c.file_mime_type.clone(),
            time: c.time.clone(),
            change_type: c.change_type.clone(),
            removed: c.removed,
            page_token: c.page_token.clone(),
        });
        self.write_rows(CHANGES_SNAPSHOT, rows)
    }

    pub fn load_changes(&self) -> Result<Vec<ChangeRecord>> {
        let rows: Vec<ChangeRow> = self.read_rows(CHANGES_SNAPSHOT)?;
        Ok(rows
            .into_iter()
            .map(|row| ChangeRecord {
                id: row.id,
                file_id: FileId::from(row.file_id),
                file_name: row.file_name,
                file_mime_type: row.file_mime_type,
                time: row.time,
                change_type: row.change_type,
                removed: row.removed,
                page_token: row.page_token,
            })
            .collect())
    }

    pub fn save_revisions(&self, revisions: &[RevisionRecord]) -> Result<PathBuf> {
        let rows = revisions.iter().map(|r| RevisionRow {
            id: r.id.to_string(),
            file_id: r.file_id.to_string(),
            mime_type: r.mime_type.clone(),
            modified_time: r.modified_time.clone(),
        });
        self.write_rows(REVISIONS_SNAPSHOT, rows)
    }

    pub fn load_revisions(&self) -> Result<Vec<RevisionRecord>> {
        let rows: Vec<RevisionRow> = self.read_rows(REVISIONS_SNAPSHOT)?;
        Ok(rows
            .into_iter()
            .map(|row| RevisionRecord {
                id: RevisionId::from(row.id),
                file_id: FileId::from(row.file_id),
                mime_type: row.mime_type,
                modified_time: row.modified_time,
            })
            .collect())
    }

    fn write_rows<R: Serialize>(
        &self,
        file_name: &str,
        rows: impl Iterator<Item = R>,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);

        let mut writer = csv::Writer::from_path(&path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        Ok(path)
    }

    fn read_rows<R: for<'de> Deserialize<'de>>(&self, file_name: &str) -> Result<Vec<R>> {
        let path = self.dir.join(file_name);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }

        Ok(rows)
    }
}
