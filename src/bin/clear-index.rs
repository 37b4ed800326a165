use spec_registry::config::Config;
use spec_registry::storage::{MetadataIndex, SqliteIndex};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db_path = &config.storage.database_path;

    println!(
        "⚠️  WARNING: This will delete ALL rows from the metadata index at {}!",
        db_path.display()
    );
    println!("Stored spec files are left in place.");
    println!("Press Enter to continue or Ctrl+C to cancel...");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    println!("🗑️  Clearing index...");
    let index = SqliteIndex::open(db_path)?;
    let removed = index.clear()?;

    println!("✅ Index cleared ({} rows removed)", removed);
    Ok(())
}
