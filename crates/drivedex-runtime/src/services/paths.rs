use tracing::info;

use drivedex_api::{DriveApi, reconstruct_path};
use drivedex_index::Database;
use drivedex_types::FileId;

use crate::Result;

/// Walk the parent chain of a file and store the rebuilt path on its cache
/// row, so the file becomes openable under the local mount prefix.
pub fn resolve_and_store_path<A: DriveApi + ?Sized>(
    api: &A,
    db: &Database,
    file_id: &FileId,
) -> Result<String> {
    let path = reconstruct_path(api, file_id)?;
    db.set_file_path(file_id, &path)?;
    info!(file_id = %file_id, path = %path, "stored reconstructed path");
    Ok(path)
}
