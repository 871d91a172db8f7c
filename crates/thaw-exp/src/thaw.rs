use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thaw_core::errors::{ErrorInfo, ThawError};
use thaw_core::TrialId;

use crate::spline::{CubicSpline, Root};
use crate::store::{DirStore, ResultsStore};
use crate::table::TrialTable;

/// Freezing point of water in kelvin, as used by the thaw batch.
pub const FREEZING_KELVIN: f64 = 273.0;

/// Options controlling thaw-time extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThawConfig {
    /// Freezing threshold the minimum temperature is compared against.
    #[serde(default = "ThawConfig::default_threshold")]
    pub threshold_kelvin: f64,
    /// Series holding the sample times.
    #[serde(default = "ThawConfig::default_time_var")]
    pub time_var: String,
    /// Series holding the minimum temperature in kelvin.
    #[serde(default = "ThawConfig::default_temperature_var")]
    pub temperature_var: String,
    /// Name of the column added to the batch table.
    #[serde(default = "ThawConfig::default_column")]
    pub column: String,
    /// Worker threads; 1 runs trials one after another.
    #[serde(default = "ThawConfig::default_concurrency")]
    pub concurrency: usize,
}

impl ThawConfig {
    const fn default_threshold() -> f64 {
        FREEZING_KELVIN
    }

    fn default_time_var() -> String {
        "t".to_string()
    }

    fn default_temperature_var() -> String {
        "Tmin".to_string()
    }

    fn default_column() -> String {
        "t".to_string()
    }

    const fn default_concurrency() -> usize {
        1
    }
}

impl Default for ThawConfig {
    fn default() -> Self {
        Self {
            threshold_kelvin: Self::default_threshold(),
            time_var: Self::default_time_var(),
            temperature_var: Self::default_temperature_var(),
            column: Self::default_column(),
            concurrency: Self::default_concurrency(),
        }
    }
}

/// What happened to one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ThawOutcome {
    /// The interpolant reaches the threshold; `root.x` is the earliest crossing.
    Found { root: Root },
    /// The series never reaches the threshold inside the sampled range.
    NotCrossed,
    /// The series loaded but cannot be interpolated.
    InvalidSeries { error: ThawError },
    /// The trial's files could not be read.
    LoadFailed { error: ThawError },
}

impl ThawOutcome {
    /// Thaw time, when one was found.
    pub fn time(&self) -> Option<f64> {
        match self {
            ThawOutcome::Found { root } => Some(root.x),
            _ => None,
        }
    }

    /// Stable label used in logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            ThawOutcome::Found { .. } => "found",
            ThawOutcome::NotCrossed => "not_crossed",
            ThawOutcome::InvalidSeries { .. } => "invalid_series",
            ThawOutcome::LoadFailed { .. } => "load_failed",
        }
    }
}

/// Outcome tagged with its trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    /// Trial the outcome belongs to.
    pub trial: TrialId,
    /// Extraction result for the trial.
    #[serde(flatten)]
    pub outcome: ThawOutcome,
}

/// Outcome counts for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThawSummary {
    /// Trials with a thaw time.
    pub found: usize,
    /// Trials that never reach the threshold.
    pub not_crossed: usize,
    /// Trials whose series cannot be interpolated.
    pub invalid_series: usize,
    /// Trials whose files could not be read.
    pub load_failed: usize,
}

impl ThawSummary {
    fn tally(outcomes: &[TrialOutcome]) -> Self {
        let mut summary = Self::default();
        for entry in outcomes {
            match entry.outcome {
                ThawOutcome::Found { .. } => summary.found += 1,
                ThawOutcome::NotCrossed => summary.not_crossed += 1,
                ThawOutcome::InvalidSeries { .. } => summary.invalid_series += 1,
                ThawOutcome::LoadFailed { .. } => summary.load_failed += 1,
            }
        }
        summary
    }
}

/// Result of a batch pass: the augmented table plus per-trial detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThawReport {
    /// Configuration the batch ran with.
    pub config: ThawConfig,
    /// Input table plus the thaw-time column.
    pub table: TrialTable,
    /// One outcome per trial, in row order.
    pub outcomes: Vec<TrialOutcome>,
    /// Outcome counts.
    pub summary: ThawSummary,
}

impl ThawReport {
    /// Outcome for a trial, if it was part of the batch.
    pub fn outcome(&self, trial: TrialId) -> Option<&ThawOutcome> {
        self.outcomes
            .iter()
            .find(|entry| entry.trial == trial)
            .map(|entry| &entry.outcome)
    }
}

/// Earliest threshold crossing of a single series.
///
/// Returns `Ok(None)` when the interpolant of `temperature - threshold`
/// has no zero between the first and last sample time.
pub fn thaw_time_for_series(
    time: &[f64],
    temperature: &[f64],
    threshold: f64,
) -> Result<Option<Root>, ThawError> {
    let shifted: Vec<f64> = temperature.iter().map(|value| value - threshold).collect();
    let spline = CubicSpline::new(time, &shifted)?;
    Ok(spline.roots().into_iter().next())
}

/// Loads and evaluates one trial. Never fails; problems become outcomes.
pub fn extract_trial<S>(store: &S, trial: TrialId, config: &ThawConfig) -> ThawOutcome
where
    S: ResultsStore + ?Sized,
{
    let loaded = store.series(trial, &config.time_var).and_then(|time| {
        store
            .series(trial, &config.temperature_var)
            .map(|temperature| (time, temperature))
    });
    let (time, temperature) = match loaded {
        Ok(pair) => pair,
        Err(error) => {
            tracing::error!(%trial, %error, "could not load trial series");
            return ThawOutcome::LoadFailed { error };
        }
    };

    match thaw_time_for_series(&time, &temperature, config.threshold_kelvin) {
        Ok(Some(root)) => {
            tracing::debug!(%trial, time = root.x, direction = ?root.direction, "thaw time found");
            ThawOutcome::Found { root }
        }
        Ok(None) => {
            tracing::warn!(%trial, "no threshold crossing in sampled range");
            ThawOutcome::NotCrossed
        }
        Err(error) => {
            let error = match error {
                ThawError::Series(info) => {
                    ThawError::Series(info.with_context("trial", trial.to_string()))
                }
                other => other,
            };
            tracing::error!(%trial, %error, "invalid trial series");
            ThawOutcome::InvalidSeries { error }
        }
    }
}

/// Computes the thaw time of every trial in `table`.
///
/// Trials are evaluated independently on `config.concurrency` workers. The
/// returned table is `table` plus `config.column`, in input row order;
/// trials without a thaw time get a missing cell.
pub fn compute_thaw_times<S>(
    table: &TrialTable,
    store: &S,
    config: &ThawConfig,
) -> Result<ThawReport, ThawError>
where
    S: ResultsStore + ?Sized,
{
    if !config.threshold_kelvin.is_finite() {
        return Err(ThawError::Config(
            ErrorInfo::new("thaw_threshold", "threshold must be finite")
                .with_context("threshold_kelvin", config.threshold_kelvin.to_string()),
        ));
    }
    let trials: Vec<TrialId> = table.trials().collect();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.concurrency.max(1))
        .build()
        .map_err(|err| ThawError::Config(ErrorInfo::new("thread_pool", err.to_string())))?;

    let mut ordered: Vec<(usize, ThawOutcome)> = pool.install(|| {
        trials
            .par_iter()
            .enumerate()
            .map(|(index, trial)| (index, extract_trial(store, *trial, config)))
            .collect()
    });
    ordered.sort_by_key(|(index, _)| *index);

    let outcomes: Vec<TrialOutcome> = ordered
        .into_iter()
        .map(|(index, outcome)| TrialOutcome {
            trial: trials[index],
            outcome,
        })
        .collect();
    let mut augmented = table.clone();
    augmented.set_column(
        config.column.clone(),
        outcomes.iter().map(|entry| entry.outcome.time()).collect(),
    )?;

    let summary = ThawSummary::tally(&outcomes);
    tracing::info!(
        trials = outcomes.len(),
        found = summary.found,
        not_crossed = summary.not_crossed,
        invalid_series = summary.invalid_series,
        load_failed = summary.load_failed,
        "thaw times computed"
    );
    Ok(ThawReport {
        config: config.clone(),
        table: augmented,
        outcomes,
        summary,
    })
}

/// [`compute_thaw_times`] over a solver results directory.
pub fn compute_thaw_times_in_dir(
    table: &TrialTable,
    results_dir: &Path,
    config: &ThawConfig,
) -> Result<ThawReport, ThawError> {
    compute_thaw_times(table, &DirStore::new(results_dir), config)
}
