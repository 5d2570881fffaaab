use clap::Parser;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "graphload",
    version,
    about = "Migrate a relational curation snapshot into a bulk-loadable property graph"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into an exit code.
///
/// Exit codes:
///   0 — success
///   1 — general/unknown error
///   2 — configuration error
///   3 — snapshot not found
///   4 — source database error
///   5 — target/sink error
///   6 — interaction or taxonomy data error
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    let lower = format!("{err:#}").to_lowercase();

    if lower.contains("snapshot not found") || lower.contains("cannot resolve path") {
        3 // snapshot not found
    } else if lower.contains("config") {
        2 // config error
    } else if lower.contains("sqlite") || lower.contains("source error") {
        4 // source database error
    } else if lower.contains("sink")
        || lower.contains("cannot persist instance")
        || lower.contains("target directory")
    {
        5 // target/sink error
    } else if lower.contains("interaction") || lower.contains("taxonomy") {
        6 // interaction data error
    } else {
        1 // general error
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match commands::run(cli.command) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}
