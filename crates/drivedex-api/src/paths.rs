//! Drive-side path reconstruction.
//!
//! v3 dropped the parents listing, so the only way to recover a file's path
//! is to walk `files.get(fields=name,parents)` up the ancestor chain. The
//! root folder has no parents and is not part of the rendered path.

use drivedex_types::FileId;

use crate::client::DriveApi;
use crate::error::{Error, Result};

/// Ancestor chains deeper than this indicate a parent loop in the metadata
const MAX_DEPTH: usize = 64;

/// Rebuild the `/folder/.../name` path of a file by following parent links
/// to the root. One `files.get` request per ancestor.
pub fn reconstruct_path<A: DriveApi + ?Sized>(api: &A, file_id: &FileId) -> Result<String> {
    let mut path = String::new();
    let mut current = file_id.clone();

    for _ in 0..MAX_DEPTH {
        let fields = api.file_fields(&current)?;
        let Some(parent) = fields.parents.first() else {
            // reached the drive root; its name is not part of the path
            return Ok(path);
        };

        let name = fields.name.unwrap_or_default();
        path = format!("/{}{}", name, path);
        current = FileId::from(parent.as_str());
    }

    Err(Error::Shape(format!(
        "parent chain of {} exceeds {} levels",
        file_id, MAX_DEPTH
    )))
}
