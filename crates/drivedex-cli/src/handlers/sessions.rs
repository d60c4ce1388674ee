use anyhow::Result;

use drivedex_index::Database;
use drivedex_runtime::Config;
use drivedex_runtime::services::{OpenPlan, SessionService};

use super::output::{header, truncate};
use crate::types::OutputFormat;

pub fn list(db: &Database, limit: usize, format: OutputFormat) -> Result<()> {
    let sessions = SessionService::new(db).list(Some(limit))?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No stored sessions. Open some files with `drivedex open` first.");
        return Ok(());
    }

    println!(
        "{}",
        header(&format!(
            "{:>4} {:<24} {:>5} {:>5} {}",
            "ID", "NAME", "USED", "FILES", "UPDATED"
        ))
    );
    for session in &sessions {
        println!(
            "{:>4} {:<24} {:>5} {:>5} {}",
            session.id,
            truncate(session.name.as_deref().unwrap_or("-"), 23),
            session.nused,
            session.file_count,
            session.updated_at
        );
    }

    Ok(())
}

pub fn open(db: &Database, config: &Config, selector: &str, dry_run: bool) -> Result<()> {
    let service = SessionService::new(db);
    let plan = service.plan_open_session(selector)?;
    open_plan(&service, config, &plan, dry_run)
}

/// Shared tail of `sessions open` and ad-hoc `open`: list or spawn viewers.
pub fn open_plan(
    service: &SessionService<'_>,
    config: &Config,
    plan: &OpenPlan,
    dry_run: bool,
) -> Result<()> {
    let label = if plan.reused { "reused" } else { "created" };
    println!(
        "Session {} ({}, {} files)",
        plan.session_id,
        label,
        plan.files.len()
    );

    if dry_run {
        for file in &plan.files {
            println!(
                "  {:<34} {}",
                file.id.as_str(),
                file.path.as_deref().unwrap_or("(no path)")
            );
        }
        return Ok(());
    }

    let report = service.open_files(&plan.files, &config.open.viewer, &config.open.mount_prefix)?;

    println!(
        "Opened {} viewers, {} exited cleanly",
        report.spawned, report.succeeded
    );
    for id in &report.skipped_no_path {
        println!("  no path for {}; run `drivedex files path {}`", id, id);
    }
    for failure in &report.failures {
        eprintln!("  {}", failure);
    }

    Ok(())
}
