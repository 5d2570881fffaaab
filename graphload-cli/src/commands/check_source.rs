use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;

use graphload_core::model::ModelRegistry;
use graphload_core::source::{SourceStore, SqliteSource};

/// Classes reported by the snapshot summary, most general first.
const REPORTED_CLASSES: [&str; 7] = [
    "DatabaseObject",
    "Event",
    "Pathway",
    "ReactionLikeEvent",
    "PhysicalEntity",
    "ReferenceEntity",
    "Person",
];

#[derive(Args, Debug)]
pub struct CheckSourceArgs {
    /// Path to the curation snapshot (SQLite database)
    pub database: PathBuf,
}

pub fn run(args: CheckSourceArgs) -> anyhow::Result<()> {
    if !args.database.exists() {
        anyhow::bail!("Snapshot not found: {}", args.database.display());
    }

    let model = Arc::new(ModelRegistry::curation());
    let source = SqliteSource::open(&args.database, model)
        .with_context(|| format!("Cannot open snapshot: {}", args.database.display()))?;

    println!("Snapshot {}", args.database.display());
    match source.release_number().context("Cannot read release number")? {
        Some(release) => println!("  Release:    {release}"),
        None => println!("  Release:    (not recorded)"),
    }
    println!("  Max db id:  {}", source.max_db_id().context("Cannot read max db id")?);
    println!("  Checksum:   {}", source.checksum().context("Cannot compute checksum")?);
    println!();

    for class in REPORTED_CLASSES {
        let count = source
            .instance_count(class)
            .with_context(|| format!("Cannot count {class} instances"))?;
        println!("  {count:>10}  {class}");
    }

    let front_pages = source
        .fetch_by_class("FrontPage")
        .context("Cannot fetch front page")?;
    println!();
    match front_pages.first() {
        Some(page) => {
            let items = source
                .values(page.db_id, "frontPageItem")
                .context("Cannot read front page items")?;
            println!("  Front page with {} top-level pathways", items.len());
        }
        None => println!("  No front page: the pathway walk would import nothing"),
    }

    Ok(())
}
