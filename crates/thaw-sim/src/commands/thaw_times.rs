use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use thaw_exp::{
    build_trials, compute_thaw_times_in_dir, to_canonical_json_bytes, SweepPlan, ThawConfig,
    TrialTable,
};

#[derive(Args, Debug)]
pub struct ThawTimesArgs {
    /// Results directory written by the solver.
    #[arg(long)]
    pub batch: PathBuf,
    /// Trial table; `<batch>/trials.csv` when omitted, else the standard sweep.
    #[arg(long)]
    pub trials: Option<PathBuf>,
    /// Destination CSV for the augmented table.
    #[arg(long)]
    pub out: PathBuf,
    /// Threshold temperature in kelvin.
    #[arg(long)]
    pub threshold: Option<f64>,
    #[arg(long)]
    pub time_var: Option<String>,
    #[arg(long)]
    pub temperature_var: Option<String>,
    /// Name of the added column.
    #[arg(long)]
    pub column: Option<String>,
    /// Worker threads.
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Optional JSON report with per-trial outcomes.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl ThawTimesArgs {
    fn config(&self) -> ThawConfig {
        let mut config = ThawConfig::default();
        if let Some(threshold) = self.threshold {
            config.threshold_kelvin = threshold;
        }
        if let Some(var) = &self.time_var {
            config.time_var = var.clone();
        }
        if let Some(var) = &self.temperature_var {
            config.temperature_var = var.clone();
        }
        if let Some(column) = &self.column {
            config.column = column.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        config
    }

    fn table(&self) -> Result<TrialTable, Box<dyn Error>> {
        let path = self
            .trials
            .clone()
            .unwrap_or_else(|| self.batch.join("trials.csv"));
        if self.trials.is_some() || path.exists() {
            return Ok(TrialTable::read_csv(&path)?);
        }
        tracing::info!("no trial table found, using the standard sweep");
        Ok(build_trials(&SweepPlan::thaw_defaults())?)
    }
}

pub fn run(args: &ThawTimesArgs) -> Result<(), Box<dyn Error>> {
    let table = args.table()?;
    let report = compute_thaw_times_in_dir(&table, &args.batch, &args.config())?;
    report.table.write_csv(&args.out)?;
    if let Some(path) = &args.report {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, to_canonical_json_bytes(&report)?)?;
    }
    println!(
        "found={} not_crossed={} invalid_series={} load_failed={}",
        report.summary.found,
        report.summary.not_crossed,
        report.summary.invalid_series,
        report.summary.load_failed
    );
    Ok(())
}
