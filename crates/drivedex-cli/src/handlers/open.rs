use anyhow::Result;

use drivedex_index::Database;
use drivedex_runtime::Config;
use drivedex_runtime::services::SessionService;
use drivedex_types::FileId;

use super::sessions::open_plan;

/// Open an ad-hoc file set, reusing the session that holds exactly this set
/// or recording a new one.
pub fn handle(
    db: &Database,
    config: &Config,
    file_ids: &[String],
    name: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let ids: Vec<FileId> = file_ids.iter().map(|id| FileId::from(id.as_str())).collect();

    let service = SessionService::new(db);
    let plan = service.plan_open_set(name, &ids)?;
    open_plan(&service, config, &plan, dry_run)
}
