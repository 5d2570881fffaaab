pub mod check_source;
pub mod import;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full import: curation snapshot to bulk graph directory
    Import(import::ImportArgs),
    /// Inspect a snapshot and report its shape without writing anything
    CheckSource(check_source::CheckSourceArgs),
}

pub fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Import(args) => import::run(args),
        Command::CheckSource(args) => check_source::run(args),
    }
}
