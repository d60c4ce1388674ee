use anyhow::{Result, bail};

use drivedex_api::HttpDriveClient;
use drivedex_index::Database;
use drivedex_runtime::Config;
use drivedex_runtime::services::{SyncRequest, SyncService, resolve_and_store_path};
use drivedex_types::{AccessState, FileId, PageToken};

use super::output::{header, truncate};
use crate::types::OutputFormat;

pub fn list(
    db: &Database,
    limit: usize,
    include_forbidden: bool,
    format: OutputFormat,
) -> Result<()> {
    let files = db.list_files(Some(limit), include_forbidden)?;

    if format == OutputFormat::Json {
        let rows: Vec<serde_json::Value> = files
            .iter()
            .map(|f| {
                serde_json::json!({
                    "id": f.id.as_str(),
                    "name": f.name,
                    "mime_type": f.mime_type,
                    "path": f.path,
                    "access": f.access.as_str(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if files.is_empty() {
        println!("No cached files. Run `drivedex sync` first.");
        return Ok(());
    }

    println!(
        "{}",
        header(&format!(
            "{:<34} {:<40} {:<30} {}",
            "ID", "NAME", "MIME", "ACCESS"
        ))
    );
    for file in &files {
        println!(
            "{:<34} {:<40} {:<30} {}",
            truncate(file.id.as_str(), 33),
            truncate(&file.name, 39),
            truncate(&file.mime_type, 29),
            file.access.as_str()
        );
    }

    Ok(())
}

pub fn fetch(
    db: &Database,
    config: &Config,
    start_page_token: Option<String>,
    max_pages: Option<usize>,
    no_push: bool,
    format: OutputFormat,
) -> Result<()> {
    let token = config.bearer_token()?;
    let client = HttpDriveClient::from_url(&config.drive.api_base, token)?;

    let request = SyncRequest {
        start_token: start_page_token.as_deref().map(PageToken::from),
        max_pages,
        resume_policy: config.sync.on_failure,
        push: !no_push,
    };

    let service = SyncService::new(&client, db);
    let report = service.run_file_listing(&request)?;

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "start_token": report.start_token.as_str(),
                "files_seen": report.files.len(),
                "files_upserted": report.upserted,
                "resume_token": report.resume_token.as_ref().map(|t| t.as_str()),
                "error": report.error.as_deref(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Plain => {
            println!("Walked file listing from token {}", report.start_token);
            println!(
                "  files : {} seen, {} upserted",
                report.files.len(),
                report.upserted
            );
            match &report.resume_token {
                Some(token) => println!("  resume: {}", token),
                None => println!("  resume: listing complete"),
            }
        }
    }

    if let Some(error) = &report.error {
        bail!("file listing aborted early: {}", error);
    }

    Ok(())
}

pub fn reconstruct_path(db: &Database, config: &Config, file_id: &str) -> Result<()> {
    let token = config.bearer_token()?;
    let client = HttpDriveClient::from_url(&config.drive.api_base, token)?;

    let id = FileId::from(file_id);
    let path = resolve_and_store_path(&client, db, &id)?;

    println!("{}{}", config.open.mount_prefix, path);
    Ok(())
}

pub fn restore(db: &Database, file_id: &str) -> Result<()> {
    let id = FileId::from(file_id);
    db.set_file_access(&id, AccessState::Active)?;
    println!("Restored {}; revision fetches will try it again", file_id);
    Ok(())
}
