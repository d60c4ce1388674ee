use std::time::Duration;

use anyhow::{Result, bail};
use tracing::info;

use drivedex_api::HttpDriveClient;
use drivedex_index::Database;
use drivedex_runtime::Config;
use drivedex_runtime::services::{SyncRequest, SyncService};
use drivedex_types::ResumePolicy;

use crate::types::OnFailureArg;

/// Poll the change feed until interrupted. Single-threaded: one sync cycle,
/// one sleep, repeat. A failed walk aborts the loop; whatever it fetched is
/// already persisted and the operator decides how to resume.
pub fn handle(
    db: &Database,
    config: &Config,
    interval_hours: f64,
    max_pages: Option<usize>,
    on_failure: Option<OnFailureArg>,
) -> Result<()> {
    if !interval_hours.is_finite() || interval_hours <= 0.0 {
        bail!("--interval-hours must be a positive number");
    }

    let policy: ResumePolicy = on_failure.map(Into::into).unwrap_or(config.sync.on_failure);
    let interval = Duration::from_secs_f64(interval_hours * 3600.0);

    let token = config.bearer_token()?;
    let client = HttpDriveClient::from_url(&config.drive.api_base, token)?;
    let service = SyncService::new(&client, db);

    let request = SyncRequest {
        start_token: None,
        max_pages,
        resume_policy: policy,
        push: true,
    };

    for cycle in 1u64.. {
        info!(cycle, "starting poll cycle");
        let report = service.run(&request)?;

        println!(
            "cycle {}: {} changes, {} files, resume {}",
            cycle,
            report.changes.len(),
            report.files.len(),
            report
                .resume_token
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "cleared".to_string())
        );

        if let Some(error) = &report.error {
            bail!("poll cycle {} aborted: {}; restart to resume", cycle, error);
        }

        info!(seconds = interval.as_secs(), "sleeping until next cycle");
        std::thread::sleep(interval);
    }

    unreachable!("polling loop only exits via error");
}
