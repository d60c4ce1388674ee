use crate::types::{FilterArg, LogLevel, OnFailureArg, OutputFormat};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "drivedex")]
#[command(about = "Cache Google Drive metadata locally and reopen PDF reading sessions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory (defaults to DRIVEDEX_PATH, then the XDG data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, default_value = "info", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory, default config and empty cache
    Init {
        /// Rewrite config.toml with defaults even if it exists
        #[arg(long)]
        refresh: bool,
    },

    /// Walk the change feed once and persist what came back
    Sync {
        /// Start token; defaults to the stored cursor, then a fresh
        /// head-of-feed token
        #[arg(short = 't', long)]
        start_page_token: Option<String>,

        /// Max number of page requests for this run
        #[arg(short = 'n', long)]
        max_pages: Option<usize>,

        /// Fetch but do not write file/change rows to the cache
        #[arg(long)]
        no_push: bool,

        /// Also write CSV snapshots of the fetched batch
        #[arg(short = 's', long)]
        save: bool,

        /// Print what would be done and exit without any request
        #[arg(long)]
        dry_run: bool,

        /// Cursor handling when the walk fails mid-feed
        /// (defaults to the config value)
        #[arg(long)]
        on_failure: Option<OnFailureArg>,
    },

    /// Cached file operations
    Files {
        #[command(subcommand)]
        command: FilesCommand,
    },

    /// Per-file revision operations
    Revisions {
        #[command(subcommand)]
        command: RevisionsCommand,
    },

    /// Stored reading sessions
    Sessions {
        #[command(subcommand)]
        command: SessionsCommand,
    },

    /// Open an ad-hoc set of files, reusing or recording a session
    Open {
        /// File ids to open together
        #[arg(required = true)]
        file_ids: Vec<String>,

        /// Name for the session if a new one is created
        #[arg(long)]
        name: Option<String>,

        /// Resolve the session and list files without spawning viewers
        #[arg(short = 'd', long)]
        dry_run: bool,
    },

    /// Poll the change feed on an interval until interrupted
    Watch {
        #[arg(long, default_value = "6.0")]
        interval_hours: f64,

        /// Max number of page requests per cycle
        #[arg(short = 'n', long)]
        max_pages: Option<usize>,

        /// Cursor handling when a walk fails mid-feed
        #[arg(long)]
        on_failure: Option<OnFailureArg>,
    },

    /// Cache maintenance
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
}

#[derive(Subcommand)]
pub enum FilesCommand {
    List {
        #[arg(long, default_value = "50")]
        limit: usize,

        /// Include files marked forbidden
        #[arg(long)]
        include_forbidden: bool,
    },

    /// Walk the file listing feed and cache what comes back
    Fetch {
        /// Start token; defaults to the stored file cursor, then the
        /// change cursor, then a fresh token
        #[arg(short = 't', long)]
        start_page_token: Option<String>,

        /// Max number of page requests for this run
        #[arg(short = 'n', long)]
        max_pages: Option<usize>,

        /// Fetch but do not write file rows to the cache
        #[arg(long)]
        no_push: bool,
    },

    /// Reconstruct and store the Drive-side path of a file
    Path { file_id: String },

    /// Reset a forbidden file so revision fetches try it again
    Restore { file_id: String },
}

#[derive(Subcommand)]
pub enum RevisionsCommand {
    /// Fetch revision lists for cached files, one request per file
    Fetch {
        /// Max number of files to fetch revisions for
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        #[arg(long, default_value = "all")]
        filter: FilterArg,

        /// Take the working set from the files.csv snapshot instead of
        /// the cache
        #[arg(long)]
        use_cache: bool,

        /// Fetch but do not write revision rows to the cache
        #[arg(long)]
        no_push: bool,

        /// Also write a CSV snapshot of the fetched revisions
        #[arg(short = 's', long)]
        save: bool,
    },

    /// Revision counts and activity span per file
    Stats {
        #[arg(long, default_value = "25")]
        limit: usize,
    },
}

#[derive(Subcommand)]
pub enum SessionsCommand {
    List {
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Reopen a stored session by id or name
    Open {
        selector: String,

        /// List the session's files without spawning viewers
        #[arg(short = 'd', long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum DbCommand {
    Vacuum,
}
