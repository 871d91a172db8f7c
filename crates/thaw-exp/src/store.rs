use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;

use thaw_core::errors::{ErrorInfo, ThawError};
use thaw_core::io::read_f64_file;
use thaw_core::TrialId;

/// Depth profiles recorded at successive snapshot times.
///
/// Stored snapshot-major: one column per snapshot, each column one value per
/// cell. Columns are ordered by snapshot number.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotStack {
    indices: Vec<u64>,
    columns: Vec<Vec<f64>>,
}

impl SnapshotStack {
    /// Orders snapshots by number and checks they share one length.
    pub fn from_snapshots(mut snapshots: Vec<(u64, Vec<f64>)>) -> Result<Self, ThawError> {
        if snapshots.is_empty() {
            return Err(ThawError::Io(ErrorInfo::new(
                "store_no_snapshots",
                "no snapshot files were found",
            )));
        }
        snapshots.sort_by_key(|(index, _)| *index);
        if let Some(pair) = snapshots.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(ThawError::Io(
                ErrorInfo::new("store_duplicate_snapshot", "snapshot number appears twice")
                    .with_context("snapshot", pair[0].0.to_string()),
            ));
        }
        let rows = snapshots[0].1.len();
        if let Some((index, values)) = snapshots.iter().find(|(_, values)| values.len() != rows) {
            return Err(ThawError::Io(
                ErrorInfo::new("store_ragged_snapshots", "snapshot lengths differ")
                    .with_context("snapshot", index.to_string())
                    .with_context("expected", rows.to_string())
                    .with_context("found", values.len().to_string()),
            ));
        }
        let (indices, columns) = snapshots.into_iter().unzip();
        Ok(Self { indices, columns })
    }

    /// Snapshot numbers in order.
    pub fn indices(&self) -> &[u64] {
        &self.indices
    }

    /// Values per snapshot (cells).
    pub fn n_rows(&self) -> usize {
        self.columns[0].len()
    }

    /// Number of snapshots.
    pub fn n_snapshots(&self) -> usize {
        self.columns.len()
    }

    /// Profile recorded at the `k`-th snapshot.
    pub fn column(&self, k: usize) -> Option<&[f64]> {
        self.columns.get(k).map(Vec::as_slice)
    }

    /// History of one cell across all snapshots.
    pub fn row(&self, i: usize) -> Option<Vec<f64>> {
        if i >= self.n_rows() {
            return None;
        }
        Some(self.columns.iter().map(|column| column[i]).collect())
    }

    /// Writes the stack as CSV: one row per cell, one `<label>_<n>` column per
    /// snapshot.
    pub fn to_writer<W: Write>(&self, label: &str, writer: W) -> Result<(), ThawError> {
        let mut wtr = WriterBuilder::new().from_writer(writer);
        let header: Vec<String> = self
            .indices
            .iter()
            .map(|index| format!("{label}_{index}"))
            .collect();
        wtr.write_record(&header)
            .map_err(|err| csv_error("snapshot_write_header", err))?;
        for i in 0..self.n_rows() {
            let record: Vec<String> = self
                .columns
                .iter()
                .map(|column| column[i].to_string())
                .collect();
            wtr.write_record(&record)
                .map_err(|err| csv_error("snapshot_write_row", err))?;
        }
        wtr.flush()
            .map_err(|err| csv_error("snapshot_flush", err.into()))
    }

    /// Writes the stack to disk, creating parent directories as needed.
    pub fn write_csv(&self, label: &str, path: &Path) -> Result<(), ThawError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| ThawError::io("snapshot_out_dir", parent, err))?;
        }
        let file =
            File::create(path).map_err(|err| ThawError::io("snapshot_create", path, err))?;
        self.to_writer(label, BufWriter::new(file))
            .map_err(|err| match err {
                ThawError::Serde(info) => {
                    ThawError::Serde(info.with_context("path", path.display().to_string()))
                }
                other => other,
            })
    }
}

/// Read-only access to per-trial solver output.
pub trait ResultsStore: Send + Sync {
    /// Loads a 1-D variable such as `t` or `Tmin`.
    fn series(&self, trial: TrialId, var: &str) -> Result<Vec<f64>, ThawError>;

    /// Loads and stacks every snapshot of a variable such as `T`.
    fn snapshots(&self, trial: TrialId, var: &str) -> Result<SnapshotStack, ThawError>;
}

/// Results directory written by the solver.
///
/// Series live in `<trial>_<var>`, snapshots in `<trial>_<var>_<n>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Opens a store rooted at `root`. Nothing is read until a lookup.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the store reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a series file.
    pub fn series_path(&self, trial: TrialId, var: &str) -> PathBuf {
        self.root.join(format!("{trial}_{var}"))
    }
}

impl ResultsStore for DirStore {
    fn series(&self, trial: TrialId, var: &str) -> Result<Vec<f64>, ThawError> {
        read_f64_file(&self.series_path(trial, var))
    }

    fn snapshots(&self, trial: TrialId, var: &str) -> Result<SnapshotStack, ThawError> {
        let prefix = format!("{trial}_{var}_");
        let entries =
            fs::read_dir(&self.root).map_err(|err| ThawError::io("store_list", &self.root, err))?;
        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| ThawError::io("store_list", &self.root, err))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(suffix) = name.strip_prefix(&prefix) else {
                continue;
            };
            if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            let Ok(index) = suffix.parse::<u64>() else {
                continue;
            };
            snapshots.push((index, read_f64_file(&entry.path())?));
        }
        SnapshotStack::from_snapshots(snapshots).map_err(|err| match err {
            ThawError::Io(info) => ThawError::Io(
                info.with_context("trial", trial.to_string())
                    .with_context("var", var),
            ),
            other => other,
        })
    }
}

/// In-memory store, mainly for synthetic batches.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    series: BTreeMap<(TrialId, String), Vec<f64>>,
    snapshots: BTreeMap<(TrialId, String), Vec<(u64, Vec<f64>)>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a series, replacing any previous one.
    pub fn insert_series(&mut self, trial: TrialId, var: impl Into<String>, values: Vec<f64>) {
        self.series.insert((trial, var.into()), values);
    }

    /// Registers one snapshot of a variable.
    pub fn insert_snapshot(
        &mut self,
        trial: TrialId,
        var: impl Into<String>,
        index: u64,
        values: Vec<f64>,
    ) {
        self.snapshots
            .entry((trial, var.into()))
            .or_default()
            .push((index, values));
    }
}

impl ResultsStore for MemoryStore {
    fn series(&self, trial: TrialId, var: &str) -> Result<Vec<f64>, ThawError> {
        self.series
            .get(&(trial, var.to_string()))
            .cloned()
            .ok_or_else(|| missing(trial, var))
    }

    fn snapshots(&self, trial: TrialId, var: &str) -> Result<SnapshotStack, ThawError> {
        let snapshots = self
            .snapshots
            .get(&(trial, var.to_string()))
            .cloned()
            .ok_or_else(|| missing(trial, var))?;
        SnapshotStack::from_snapshots(snapshots)
    }
}

fn csv_error(code: &str, err: csv::Error) -> ThawError {
    ThawError::Serde(ErrorInfo::new(code, err.to_string()))
}

fn missing(trial: TrialId, var: &str) -> ThawError {
    ThawError::Io(
        ErrorInfo::new("store_missing", "no data recorded for this trial and variable")
            .with_context("trial", trial.to_string())
            .with_context("var", var),
    )
}
