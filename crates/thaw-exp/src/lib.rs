//! Batch post-processing of solver trials: trial tables, sweep expansion,
//! results stores and thaw-time extraction.

mod serde;
mod spline;
mod store;
mod sweep;
mod table;
mod thaw;

pub use spline::{CubicSpline, Crossing, Root};
pub use store::{DirStore, MemoryStore, ResultsStore, SnapshotStack};
pub use sweep::{build_trials, linspace, load_plan, ParameterRange, SweepPlan};
pub use table::{TrialRow, TrialTable};
pub use thaw::{
    compute_thaw_times, compute_thaw_times_in_dir, extract_trial, thaw_time_for_series,
    ThawConfig, ThawOutcome, ThawReport, ThawSummary, TrialOutcome, FREEZING_KELVIN,
};

pub use serde::{from_json_slice, from_yaml_slice, to_canonical_json_bytes, to_yaml_string};
