use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use thaw_exp::{build_trials, load_plan, to_yaml_string, SweepPlan};

#[derive(Args, Debug)]
pub struct TrialsArgs {
    /// YAML sweep plan; the standard thaw batch when omitted.
    #[arg(long)]
    pub plan: Option<PathBuf>,
    /// Destination CSV.
    #[arg(long)]
    pub out: PathBuf,
    /// Also write the resolved plan as YAML.
    #[arg(long)]
    pub save_plan: Option<PathBuf>,
}

pub fn run(args: &TrialsArgs) -> Result<(), Box<dyn Error>> {
    let plan = match &args.plan {
        Some(path) => load_plan(path)?,
        None => SweepPlan::thaw_defaults(),
    };
    let table = build_trials(&plan)?;
    table.write_csv(&args.out)?;
    if let Some(path) = &args.save_plan {
        fs::write(path, to_yaml_string(&plan)?)?;
    }
    println!("trials={} out={}", table.len(), args.out.display());
    Ok(())
}
