use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tracing::info;

use graphload_core::config::ImportConfig;
use graphload_core::engine::{ImportSession, SessionOptions};
use graphload_core::enrich::TsvInteractions;
use graphload_core::model::ModelRegistry;
use graphload_core::progress::{IndicatifReporter, NoopReporter, ProgressReporter};
use graphload_core::providers::TrivialMolecules;
use graphload_core::sink::BulkSink;
use graphload_core::source::SqliteSource;
use graphload_core::taxonomy::EnsemblClient;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Path to the curation snapshot (SQLite database)
    #[arg(short = 'd', long)]
    pub database: Option<PathBuf>,

    /// Target directory for the bulk graph output
    #[arg(short = 't', long)]
    pub target: Option<PathBuf>,

    /// Configuration file (default: ./graphload.toml when present)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Logical database name recorded in the graph's info node
    #[arg(long)]
    pub name: Option<String>,

    /// Add interaction data after the main import
    #[arg(long)]
    pub interactions: bool,

    /// Pre-fetched tab-separated interaction dataset
    #[arg(long)]
    pub interactions_file: Option<PathBuf>,

    /// Tab-separated trivial small-molecule accession list
    #[arg(long)]
    pub trivial_molecules: Option<PathBuf>,

    /// Write the consistency report CSV to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_bar: bool,
}

pub fn run(args: ImportArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(database) = args.database {
        config.source.path = database;
    }
    if let Some(target) = args.target {
        config.target.path = target;
    }
    if let Some(name) = args.name {
        config.source.name = name;
    }
    if args.interactions {
        config.interactions.enabled = true;
    }
    if args.interactions_file.is_some() {
        config.interactions.file = args.interactions_file;
    }
    if args.trivial_molecules.is_some() {
        config.interactions.trivial_molecules = args.trivial_molecules;
    }

    if !config.source.path.exists() {
        anyhow::bail!("Snapshot not found: {}", config.source.path.display());
    }

    let model = Arc::new(ModelRegistry::curation());
    let source = SqliteSource::open(&config.source.path, Arc::clone(&model))
        .with_context(|| format!("Cannot open snapshot: {}", config.source.path.display()))?;
    let mut sink = BulkSink::open(&config.target.path)
        .with_context(|| format!("Cannot prepare target directory: {}", config.target.path.display()))?;

    let trivial = config
        .interactions
        .trivial_molecules
        .as_deref()
        .map(|path| {
            TrivialMolecules::from_path(path)
                .with_context(|| format!("Cannot read trivial molecules: {}", path.display()))
        })
        .transpose()?;

    let (dataset, taxonomy) = if config.interactions.enabled {
        let file = config
            .interactions
            .file
            .as_deref()
            .context("Interaction import enabled but no interactions file configured")?;
        info!(file = %file.display(), "loading interaction dataset");
        let dataset = TsvInteractions::from_path(file)
            .with_context(|| format!("Cannot read interaction dataset: {}", file.display()))?;
        let client = EnsemblClient::new().context("Cannot build taxonomy client")?;
        (Some(dataset), Some(client))
    } else {
        (None, None)
    };

    let progress: Box<dyn ProgressReporter> = if args.no_bar {
        Box::new(NoopReporter)
    } else {
        Box::new(IndicatifReporter::new())
    };

    let options = SessionOptions {
        database_name: config.source.name.clone(),
        complete_progress: config.target.complete_progress,
        report_path: args.report,
    };

    let mut session =
        ImportSession::new(&source, &mut sink, &model, options).with_progress(progress.as_ref());
    if let Some(trivial) = &trivial {
        session = session.with_trivial_molecules(trivial);
    }
    if let (Some(dataset), Some(taxonomy)) = (&dataset, &taxonomy) {
        session = session.with_interactions(dataset, taxonomy);
    }

    let summary = session.run().context("Import failed")?;

    println!("Graph written to {}", config.target.path.display());
    println!();
    println!("  Instances imported:   {}", summary.instances);
    println!("  Discarded (modified): {}", summary.discarded);
    println!("  Top-level pathways:   {}", summary.top_level_pathways);
    println!("  Consistency issues:   {}", summary.violations);
    if config.interactions.enabled {
        println!("  Interactions added:   {}", summary.interactions);
    }
    println!("  Duration:             {:.2?}", summary.elapsed);

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ImportConfig> {
    match path {
        Some(path) => ImportConfig::from_path(path)
            .with_context(|| format!("Cannot load config: {}", path.display())),
        None => {
            let default = Path::new("graphload.toml");
            if default.exists() {
                ImportConfig::from_path(default).context("Cannot load config: graphload.toml")
            } else {
                Ok(ImportConfig::default())
            }
        }
    }
}
