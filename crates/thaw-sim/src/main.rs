use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    mesh::{self, MeshArgs},
    snaps::{self, SnapsArgs},
    thaw_times::{self, ThawTimesArgs},
    trials::{self, TrialsArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "thaw-sim", about = "Crustal thaw batch tooling")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the depth grid described by a settings file.
    Mesh(MeshArgs),
    /// Expand a parameter sweep into a trial table.
    Trials(TrialsArgs),
    /// Compute the thaw time of every trial in a batch.
    ThawTimes(ThawTimesArgs),
    /// Export the snapshot stack of one trial variable as CSV.
    Snaps(SnapsArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Mesh(args) => mesh::run(&args),
        Command::Trials(args) => trials::run(&args),
        Command::ThawTimes(args) => thaw_times::run(&args),
        Command::Snaps(args) => snaps::run(&args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
