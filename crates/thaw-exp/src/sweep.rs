use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thaw_core::errors::{ErrorInfo, ThawError};
use thaw_core::TrialId;

use crate::serde::from_yaml_slice;
use crate::table::TrialTable;

/// Evenly spaced parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    /// Column name in the trial table.
    pub name: String,
    /// First value.
    pub start: f64,
    /// Last value, included.
    pub stop: f64,
    /// Number of values.
    pub count: usize,
}

impl ParameterRange {
    /// Range of `count` values from `start` to `stop`.
    pub fn new(name: impl Into<String>, start: f64, stop: f64, count: usize) -> Self {
        Self {
            name: name.into(),
            start,
            stop,
            count,
        }
    }

    /// Expands the range; errors carry the parameter name.
    pub fn values(&self) -> Result<Vec<f64>, ThawError> {
        linspace(self.start, self.stop, self.count).map_err(|err| match err {
            ThawError::Config(info) => ThawError::Config(info.with_context("parameter", &self.name)),
            other => other,
        })
    }
}

/// Full-factorial batch description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPlan {
    #[serde(default = "SweepPlan::default_index_name")]
    pub index_name: String,
    pub parameters: Vec<ParameterRange>,
}

impl SweepPlan {
    fn default_index_name() -> String {
        "trial".to_string()
    }

    /// Conductivity, geothermal flux and the two surface temperature
    /// parameters of the thaw-time batch.
    pub fn thaw_defaults() -> Self {
        Self {
            index_name: Self::default_index_name(),
            parameters: vec![
                ParameterRange::new("k0", 1.0, 7.0, 7),
                ParameterRange::new("qgeo0", 0.01, 0.1, 10),
                ParameterRange::new("Tsa", 200.0, 260.0, 30),
                ParameterRange::new("Tsb", 280.0, 320.0, 20),
            ],
        }
    }
}

/// Loads a YAML sweep plan.
pub fn load_plan(path: &Path) -> Result<SweepPlan, ThawError> {
    let bytes = fs::read(path).map_err(|err| ThawError::io("plan_read", path, err))?;
    from_yaml_slice(&bytes)
}

/// `count` evenly spaced values from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, count: usize) -> Result<Vec<f64>, ThawError> {
    if !start.is_finite() || !stop.is_finite() {
        return Err(ThawError::Config(
            ErrorInfo::new("linspace_bounds", "range bounds must be finite")
                .with_context("start", start.to_string())
                .with_context("stop", stop.to_string()),
        ));
    }
    match count {
        0 => Err(ThawError::Config(ErrorInfo::new(
            "linspace_empty",
            "a range needs at least one value",
        ))),
        1 if start != stop => Err(ThawError::Config(
            ErrorInfo::new("linspace_single", "a single value needs identical bounds")
                .with_context("start", start.to_string())
                .with_context("stop", stop.to_string()),
        )),
        1 => Ok(vec![start]),
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            Ok((0..count).map(|i| start + i as f64 * step).collect())
        }
    }
}

/// Expands a plan into a trial table.
///
/// The first parameter varies slowest. Trials are numbered from zero in
/// expansion order.
pub fn build_trials(plan: &SweepPlan) -> Result<TrialTable, ThawError> {
    if plan.parameters.is_empty() {
        return Err(ThawError::Config(ErrorInfo::new(
            "sweep_empty",
            "a sweep needs at least one parameter",
        )));
    }
    let mut names = BTreeSet::new();
    for param in &plan.parameters {
        if param.name == plan.index_name || !names.insert(param.name.as_str()) {
            return Err(ThawError::Config(
                ErrorInfo::new("sweep_duplicate", "parameter names must be unique")
                    .with_context("parameter", &param.name),
            ));
        }
    }

    let axes = plan
        .parameters
        .iter()
        .map(ParameterRange::values)
        .collect::<Result<Vec<_>, _>>()?;
    let total = axes
        .iter()
        .try_fold(1usize, |acc, axis| acc.checked_mul(axis.len()))
        .ok_or_else(|| {
            ThawError::Config(ErrorInfo::new("sweep_overflow", "trial count overflows"))
        })?;

    let columns = plan.parameters.iter().map(|p| p.name.clone()).collect();
    let mut table = TrialTable::new(plan.index_name.clone(), columns)?;
    let mut current = Vec::with_capacity(axes.len());
    let mut next_id = 0u64;
    expand(&axes, &mut current, &mut |values: &[f64]| {
        let trial = TrialId::from_raw(next_id);
        next_id += 1;
        table.push_row(trial, values.iter().copied().map(Some).collect())
    })?;
    debug_assert_eq!(table.len(), total);
    tracing::info!(trials = total, parameters = axes.len(), "expanded sweep");
    Ok(table)
}

fn expand<F>(axes: &[Vec<f64>], current: &mut Vec<f64>, emit: &mut F) -> Result<(), ThawError>
where
    F: FnMut(&[f64]) -> Result<(), ThawError>,
{
    let Some((axis, rest)) = axes.split_first() else {
        return emit(current);
    };
    for value in axis {
        current.push(*value);
        expand(rest, current, emit)?;
        current.pop();
    }
    Ok(())
}
