use std::path::Path;

use anyhow::{Result, bail};

use drivedex_api::HttpDriveClient;
use drivedex_index::Database;
use drivedex_runtime::services::{SyncReport, SyncRequest, SyncService};
use drivedex_runtime::{Config, SnapshotStore};
use drivedex_types::{CursorScope, PageToken, ResumePolicy};

use crate::types::{OnFailureArg, OutputFormat};

pub struct SyncOptions {
    pub start_page_token: Option<String>,
    pub max_pages: Option<usize>,
    pub no_push: bool,
    pub save: bool,
    pub dry_run: bool,
    pub on_failure: Option<OnFailureArg>,
}

pub fn handle(
    db: &Database,
    config: &Config,
    data_dir: &Path,
    options: SyncOptions,
    format: OutputFormat,
) -> Result<()> {
    let policy: ResumePolicy = options
        .on_failure
        .map(Into::into)
        .unwrap_or(config.sync.on_failure);

    if options.dry_run {
        return print_plan(db, &options, policy);
    }

    let token = config.bearer_token()?;
    let client = HttpDriveClient::from_url(&config.drive.api_base, token)?;

    let request = SyncRequest {
        start_token: options.start_page_token.as_deref().map(PageToken::from),
        max_pages: options.max_pages,
        resume_policy: policy,
        push: !options.no_push,
    };

    let service = SyncService::new(&client, db);
    let report = service.run(&request)?;

    if options.save {
        let store = SnapshotStore::new(data_dir);
        let files_path = store.save_files(&report.files)?;
        let changes_path = store.save_changes(&report.changes)?;
        eprintln!(
            "Saved snapshots: {}, {}",
            files_path.display(),
            changes_path.display()
        );
    }

    print_report(&report, format)?;

    if let Some(error) = &report.error {
        bail!(
            "sync aborted early: {} (fetched rows were kept; resume cursor {})",
            error,
            match &report.resume_token {
                Some(token) => format!("set to {}", token),
                None => "cleared, pick a start token manually".to_string(),
            }
        );
    }

    Ok(())
}

fn print_plan(db: &Database, options: &SyncOptions, policy: ResumePolicy) -> Result<()> {
    let start = match &options.start_page_token {
        Some(token) => format!("explicit token {}", token),
        None => match db.current_cursor(CursorScope::Change)? {
            Some(cursor) => format!("stored cursor {} ({})", cursor.value, cursor.updated_at),
            None => "fresh head-of-feed token from the API".to_string(),
        },
    };

    println!("Dry run; no requests will be made");
    println!("  start from : {}", start);
    println!(
        "  page budget: {}",
        options
            .max_pages
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unlimited".to_string())
    );
    println!("  push to db : {}", !options.no_push);
    println!("  on failure : {:?}", policy);

    Ok(())
}

fn print_report(report: &SyncReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "start_token": report.start_token.as_str(),
                "changes_fetched": report.changes.len(),
                "changes_inserted": report.changes_inserted,
                "files_seen": report.files.len(),
                "files_upserted": report.files_upserted,
                "resume_token": report.resume_token.as_ref().map(|t| t.as_str()),
                "error": report.error.as_deref(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Plain => {
            println!("Walked change feed from token {}", report.start_token);
            println!(
                "  changes: {} fetched, {} inserted",
                report.changes.len(),
                report.changes_inserted
            );
            println!(
                "  files  : {} seen, {} upserted",
                report.files.len(),
                report.files_upserted
            );
            match &report.resume_token {
                Some(token) => println!("  resume : {}", token),
                None => println!("  resume : cleared"),
            }
        }
    }

    Ok(())
}
