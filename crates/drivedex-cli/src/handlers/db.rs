use anyhow::Result;

use drivedex_index::Database;

pub fn vacuum(db: &Database) -> Result<()> {
    db.vacuum()?;
    println!("Cache vacuumed successfully");
    Ok(())
}
