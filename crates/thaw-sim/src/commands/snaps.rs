use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use thaw_core::TrialId;
use thaw_exp::{DirStore, ResultsStore};

#[derive(Args, Debug)]
pub struct SnapsArgs {
    /// Results directory written by the solver.
    #[arg(long)]
    pub batch: PathBuf,
    #[arg(long)]
    pub trial: u64,
    /// Snapshot variable, e.g. `T`.
    #[arg(long, default_value = "T")]
    pub var: String,
    /// Destination CSV: one row per cell, one column per snapshot.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &SnapsArgs) -> Result<(), Box<dyn Error>> {
    let store = DirStore::new(&args.batch);
    let stack = store.snapshots(TrialId::from_raw(args.trial), &args.var)?;
    stack.write_csv(&args.var, &args.out)?;
    tracing::info!(
        trial = args.trial,
        rows = stack.n_rows(),
        snapshots = stack.n_snapshots(),
        "snapshot stack exported"
    );
    Ok(())
}
