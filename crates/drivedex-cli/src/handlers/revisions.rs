use std::path::Path;

use anyhow::Result;

use drivedex_api::HttpDriveClient;
use drivedex_index::{Database, RevisionRecord};
use drivedex_runtime::services::{RevisionService, revision_report};
use drivedex_runtime::{Config, SnapshotStore};
use drivedex_types::{FileFilter, FileMeta};

use super::output::{header, truncate};
use crate::types::{FilterArg, OutputFormat};

pub struct FetchOptions {
    pub limit: Option<usize>,
    pub filter: FilterArg,
    /// Source the working set from files.csv instead of the cache
    pub use_cache: bool,
    pub no_push: bool,
    pub save: bool,
}

pub fn fetch(
    db: &Database,
    config: &Config,
    data_dir: &Path,
    options: FetchOptions,
    format: OutputFormat,
) -> Result<()> {
    let token = config.bearer_token()?;
    let client = HttpDriveClient::from_url(&config.drive.api_base, token)?;

    let store = SnapshotStore::new(data_dir);
    let candidates = if options.use_cache {
        store.load_files()?
    } else {
        db.list_files(None, false)?
    };

    // forbidden files never enter the working set
    let file_filter: FileFilter = options.filter.into();
    let mut working_set: Vec<FileMeta> = candidates
        .iter()
        .map(|record| record.to_meta())
        .filter(|meta| !meta.access.is_forbidden() && file_filter.matches(meta))
        .take(options.limit.unwrap_or(usize::MAX))
        .collect();

    let service = RevisionService::new(&client, db);
    let report = service.fetch(&mut working_set, !options.no_push)?;

    if options.save {
        let records: Vec<RevisionRecord> =
            report.revisions.iter().map(RevisionRecord::from).collect();
        let path = store.save_revisions(&records)?;
        eprintln!("Saved snapshot: {}", path.display());
    }

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "files_attempted": working_set.len(),
                "revisions_fetched": report.revisions.len(),
                "revisions_upserted": report.upserted,
                "skipped_forbidden": report.skipped_forbidden,
                "newly_forbidden": report
                    .forbidden
                    .iter()
                    .map(|id| id.as_str())
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Plain => {
            println!(
                "Fetched {} revisions over {} files ({} upserted)",
                report.revisions.len(),
                working_set.len(),
                report.upserted
            );
            if report.skipped_forbidden > 0 {
                println!("  skipped {} forbidden files", report.skipped_forbidden);
            }
            for id in &report.forbidden {
                println!("  marked forbidden: {}", id);
            }
        }
    }

    Ok(())
}

pub fn stats(db: &Database, limit: usize, format: OutputFormat) -> Result<()> {
    let report = revision_report(db, Some(limit))?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.is_empty() {
        println!("No cached revisions. Run `drivedex revisions fetch` first.");
        return Ok(());
    }

    println!(
        "{}",
        header(&format!(
            "{:<40} {:>5} {:<21} {:<21} {:>6}",
            "NAME", "REVS", "FIRST", "LAST", "DAYS"
        ))
    );
    for row in &report {
        println!(
            "{:<40} {:>5} {:<21} {:<21} {:>6}",
            truncate(&row.name, 39),
            row.revision_count,
            row.first_modified,
            row.last_modified,
            row.span_days
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    Ok(())
}
