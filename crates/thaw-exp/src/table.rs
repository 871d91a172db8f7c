use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use thaw_core::errors::{ErrorInfo, ThawError};
use thaw_core::TrialId;

fn table_error(code: &str, message: impl Into<String>) -> ThawError {
    ThawError::Table(ErrorInfo::new(code, message))
}

fn wrap_csv(code: &str, err: csv::Error) -> ThawError {
    ThawError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// One trial of a batch with its parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRow {
    /// Trial identifier, unique within the table.
    pub trial: TrialId,
    /// Values aligned with [`TrialTable::columns`]; `None` marks a missing value.
    pub values: Vec<Option<f64>>,
}

/// Batch index table keyed by trial.
///
/// Rows keep insertion order. Cells are numeric or missing; missing cells are
/// written to CSV as empty fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableData", into = "TableData")]
pub struct TrialTable {
    index_name: String,
    columns: Vec<String>,
    rows: Vec<TrialRow>,
    positions: BTreeMap<TrialId, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableData {
    index_name: String,
    columns: Vec<String>,
    rows: Vec<TrialRow>,
}

impl TryFrom<TableData> for TrialTable {
    type Error = ThawError;

    fn try_from(data: TableData) -> Result<Self, Self::Error> {
        let mut table = TrialTable::new(data.index_name, data.columns)?;
        for row in data.rows {
            table.push_row(row.trial, row.values)?;
        }
        Ok(table)
    }
}

impl From<TrialTable> for TableData {
    fn from(table: TrialTable) -> Self {
        Self {
            index_name: table.index_name,
            columns: table.columns,
            rows: table.rows,
        }
    }
}

impl TrialTable {
    /// Creates an empty table with the given index and parameter column names.
    pub fn new(index_name: impl Into<String>, columns: Vec<String>) -> Result<Self, ThawError> {
        let index_name = index_name.into();
        let mut seen = std::collections::BTreeSet::new();
        for name in std::iter::once(&index_name).chain(columns.iter()) {
            if !seen.insert(name.as_str()) {
                return Err(ThawError::Table(
                    ErrorInfo::new("table_duplicate_column", "column names must be unique")
                        .with_context("column", name.clone()),
                ));
            }
        }
        Ok(Self {
            index_name,
            columns,
            rows: Vec::new(),
            positions: BTreeMap::new(),
        })
    }

    /// Appends a row; the trial must be new and the values must match the columns.
    pub fn push_row(&mut self, trial: TrialId, values: Vec<Option<f64>>) -> Result<(), ThawError> {
        if values.len() != self.columns.len() {
            return Err(ThawError::Table(
                ErrorInfo::new("table_row_width", "row width does not match the columns")
                    .with_context("trial", trial.to_string())
                    .with_context("expected", self.columns.len().to_string())
                    .with_context("found", values.len().to_string()),
            ));
        }
        if self.positions.contains_key(&trial) {
            return Err(ThawError::Table(
                ErrorInfo::new("table_duplicate_trial", "trial index appears twice")
                    .with_context("trial", trial.to_string()),
            ));
        }
        self.positions.insert(trial, self.rows.len());
        self.rows.push(TrialRow { trial, values });
        Ok(())
    }

    /// Adds a column, or replaces an existing one with the same name.
    pub fn set_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), ThawError> {
        let name = name.into();
        if name == self.index_name {
            return Err(ThawError::Table(
                ErrorInfo::new("table_index_column", "cannot overwrite the index column")
                    .with_context("column", name),
            ));
        }
        if values.len() != self.rows.len() {
            return Err(ThawError::Table(
                ErrorInfo::new("table_column_length", "column length does not match the rows")
                    .with_context("column", name.clone())
                    .with_context("expected", self.rows.len().to_string())
                    .with_context("found", values.len().to_string()),
            ));
        }
        match self.column_position(&name) {
            Some(pos) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.values[pos] = value;
                }
            }
            None => {
                self.columns.push(name);
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.values.push(value);
                }
            }
        }
        Ok(())
    }

    /// Name of the index column.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Parameter column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[TrialRow] {
        &self.rows
    }

    /// Number of trials.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no trials.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Trial identifiers in row order.
    pub fn trials(&self) -> impl ExactSizeIterator<Item = TrialId> + '_ {
        self.rows.iter().map(|row| row.trial)
    }

    /// Looks up a row by trial.
    pub fn row(&self, trial: TrialId) -> Option<&TrialRow> {
        self.positions.get(&trial).map(|pos| &self.rows[*pos])
    }

    /// Copies a column out in row order.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let pos = self.column_position(name)?;
        Some(self.rows.iter().map(|row| row.values[pos]).collect())
    }

    /// Single cell lookup; `None` when the trial or column is unknown or the cell is missing.
    pub fn value(&self, trial: TrialId, name: &str) -> Option<f64> {
        let pos = self.column_position(name)?;
        self.row(trial).and_then(|row| row.values[pos])
    }

    fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Parses a CSV table whose first column holds integer trial indices.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ThawError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|err| wrap_csv("table_read_header", err))?
            .clone();
        let mut names = headers.iter().map(str::to_string);
        let index_name = names
            .next()
            .ok_or_else(|| table_error("table_no_columns", "CSV header is empty"))?;
        let mut table = TrialTable::new(index_name, names.collect())?;

        for (line, record) in rdr.records().enumerate() {
            let record = record.map_err(|err| wrap_csv("table_read_row", err))?;
            let line = line + 2;
            let raw_index = record.get(0).unwrap_or_default();
            let trial = raw_index.parse::<u64>().map_err(|err| {
                ThawError::Table(
                    ErrorInfo::new("table_bad_index", err.to_string())
                        .with_context("line", line.to_string())
                        .with_context("value", raw_index),
                )
            })?;
            let mut values = Vec::with_capacity(record.len().saturating_sub(1));
            for (offset, field) in record.iter().skip(1).enumerate() {
                values.push(parse_cell(field).map_err(|message| {
                    ThawError::Table(
                        ErrorInfo::new("table_bad_value", message)
                            .with_context("line", line.to_string())
                            .with_context(
                                "column",
                                table.columns.get(offset).cloned().unwrap_or_default(),
                            )
                            .with_context("value", field),
                    )
                })?);
            }
            table.push_row(TrialId::from_raw(trial), values)?;
        }
        Ok(table)
    }

    /// Writes the table as CSV with missing cells left empty.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), ThawError> {
        let mut wtr = WriterBuilder::new().from_writer(writer);
        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(self.index_name.as_str());
        header.extend(self.columns.iter().map(String::as_str));
        wtr.write_record(&header)
            .map_err(|err| wrap_csv("table_write_header", err))?;
        for row in &self.rows {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            record.push(row.trial.to_string());
            record.extend(row.values.iter().map(|value| match value {
                Some(v) => v.to_string(),
                None => String::new(),
            }));
            wtr.write_record(&record)
                .map_err(|err| wrap_csv("table_write_row", err))?;
        }
        wtr.flush()
            .map_err(|err| wrap_csv("table_flush", err.into()))
    }

    /// Reads a CSV table from disk.
    pub fn read_csv(path: &Path) -> Result<Self, ThawError> {
        let file = File::open(path).map_err(|err| ThawError::io("table_open", path, err))?;
        Self::from_reader(file).map_err(|err| attach_path(err, path))
    }

    /// Writes the table to disk, creating parent directories as needed.
    pub fn write_csv(&self, path: &Path) -> Result<(), ThawError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| ThawError::io("table_out_dir", parent, err))?;
        }
        let file = File::create(path).map_err(|err| ThawError::io("table_create", path, err))?;
        self.to_writer(BufWriter::new(file))
            .map_err(|err| attach_path(err, path))
    }
}

fn parse_cell(field: &str) -> Result<Option<f64>, String> {
    if field.is_empty() || field.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    field
        .parse::<f64>()
        .map(Some)
        .map_err(|err| err.to_string())
}

fn attach_path(err: ThawError, path: &Path) -> ThawError {
    let path = path.display().to_string();
    match err {
        ThawError::Table(info) => ThawError::Table(info.with_context("path", path)),
        ThawError::Serde(info) => ThawError::Serde(info.with_context("path", path)),
        other => other,
    }
}
