use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use drivedex_index::Database;
use drivedex_runtime::{Config, resolve_workspace_path};

use super::args::{Cli, Commands, DbCommand, FilesCommand, RevisionsCommand, SessionsCommand};
use super::handlers;
use crate::types::LogLevel;

pub fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.log_level);

    let data_dir = resolve_workspace_path(cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Init { refresh } => handlers::init::handle(&data_dir, refresh),

        Commands::Sync {
            start_page_token,
            max_pages,
            no_push,
            save,
            dry_run,
            on_failure,
        } => {
            let (db, config) = open_workspace(&data_dir)?;
            handlers::sync::handle(
                &db,
                &config,
                &data_dir,
                handlers::sync::SyncOptions {
                    start_page_token,
                    max_pages,
                    no_push,
                    save,
                    dry_run,
                    on_failure,
                },
                cli.format,
            )
        }

        Commands::Files { command } => {
            let (db, config) = open_workspace(&data_dir)?;
            match command {
                FilesCommand::List {
                    limit,
                    include_forbidden,
                } => handlers::files::list(&db, limit, include_forbidden, cli.format),
                FilesCommand::Fetch {
                    start_page_token,
                    max_pages,
                    no_push,
                } => handlers::files::fetch(
                    &db,
                    &config,
                    start_page_token,
                    max_pages,
                    no_push,
                    cli.format,
                ),
                FilesCommand::Path { file_id } => {
                    handlers::files::reconstruct_path(&db, &config, &file_id)
                }
                FilesCommand::Restore { file_id } => handlers::files::restore(&db, &file_id),
            }
        }

        Commands::Revisions { command } => {
            let (db, config) = open_workspace(&data_dir)?;
            match command {
                RevisionsCommand::Fetch {
                    limit,
                    filter,
                    use_cache,
                    no_push,
                    save,
                } => handlers::revisions::fetch(
                    &db,
                    &config,
                    &data_dir,
                    handlers::revisions::FetchOptions {
                        limit,
                        filter,
                        use_cache,
                        no_push,
                        save,
                    },
                    cli.format,
                ),
                RevisionsCommand::Stats { limit } => {
                    handlers::revisions::stats(&db, limit, cli.format)
                }
            }
        }

        Commands::Sessions { command } => {
            let (db, config) = open_workspace(&data_dir)?;
            match command {
                SessionsCommand::List { limit } => {
                    handlers::sessions::list(&db, limit, cli.format)
                }
                SessionsCommand::Open { selector, dry_run } => {
                    handlers::sessions::open(&db, &config, &selector, dry_run)
                }
            }
        }

        Commands::Open {
            file_ids,
            name,
            dry_run,
        } => {
            let (db, config) = open_workspace(&data_dir)?;
            handlers::open::handle(&db, &config, &file_ids, name.as_deref(), dry_run)
        }

        Commands::Watch {
            interval_hours,
            max_pages,
            on_failure,
        } => {
            let (db, config) = open_workspace(&data_dir)?;
            handlers::watch::handle(&db, &config, interval_hours, max_pages, on_failure)
        }

        Commands::Db { command } => {
            let db = open_database(&data_dir)?;
            match command {
                DbCommand::Vacuum => handlers::db::vacuum(&db),
            }
        }
    }
}

fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_database(data_dir: &Path) -> Result<Database> {
    let db_path = data_dir.join("drivedex.db");
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Database::open(&db_path).with_context(|| format!("opening cache at {}", db_path.display()))
}

fn open_workspace(data_dir: &Path) -> Result<(Database, Config)> {
    let db = open_database(data_dir)?;
    let config = Config::load_from(&data_dir.join("config.toml"))?;
    Ok((db, config))
}
