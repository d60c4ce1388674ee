use std::path::Path;

use anyhow::Result;

use drivedex_index::Database;
use drivedex_runtime::Config;

/// Set up the workspace: data dir, default config.toml, empty cache schema.
pub fn handle(data_dir: &Path, refresh: bool) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;

    let config_path = data_dir.join("config.toml");
    if refresh || !config_path.exists() {
        Config::default().save_to(&config_path)?;
        println!("Wrote default config to {}", config_path.display());
    } else {
        println!("Config already present at {}", config_path.display());
    }

    let db_path = data_dir.join("drivedex.db");
    Database::open(&db_path)?;
    println!("Cache ready at {}", db_path.display());

    println!();
    println!("Next steps:");
    println!("  1. export DRIVEDEX_TOKEN with an OAuth bearer token for the Drive API");
    println!("  2. drivedex sync            # walk the change feed");
    println!("  3. drivedex revisions fetch # pull per-file revision lists");

    Ok(())
}
