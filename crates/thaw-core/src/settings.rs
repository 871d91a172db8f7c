//! Solver settings files.
//!
//! The solver reads `key = value` lines with `#` comments. Only the grid keys
//! matter to post-processing; everything else is carried through untouched so
//! the same file can drive both sides.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, ThawError};

/// Grid section of a settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    /// Domain depth in metres.
    pub depth: f64,
    /// Width of the surface cell in metres.
    pub delz0: f64,
    /// Growth factor between a cell and its shallower neighbour.
    pub delzfrac: f64,
    /// Maximum cell width in metres.
    pub delzmax: f64,
    /// Whether grid arrays should be written next to the results.
    pub save_grid: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            depth: 1.0,
            delz0: 0.01,
            delzfrac: 1.0,
            delzmax: 1.0,
            save_grid: false,
        }
    }
}

/// Parsed settings file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Typed grid parameters.
    pub grid: GridSettings,
    /// Remaining solver keys, verbatim.
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
}

impl Settings {
    /// Loads and parses a settings file from disk.
    pub fn load(path: &Path) -> Result<Self, ThawError> {
        let text =
            fs::read_to_string(path).map_err(|err| ThawError::io("settings_read", path, err))?;
        let pairs = parse_values(&text).map_err(|err| match err {
            ThawError::Config(info) => {
                ThawError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })?;
        Self::from_pairs(pairs)
    }

    /// Builds settings from ordered key/value pairs. Later keys win.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ThawError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut settings = Settings::default();
        for (key, value) in pairs {
            match key.as_str() {
                "depth" => settings.grid.depth = parse_f64(&key, &value)?,
                "delz0" => settings.grid.delz0 = parse_f64(&key, &value)?,
                "delzfrac" => settings.grid.delzfrac = parse_f64(&key, &value)?,
                "delzmax" => settings.grid.delzmax = parse_f64(&key, &value)?,
                "save_grid" => settings.grid.save_grid = parse_bool(&key, &value)?,
                _ => {
                    settings.entries.insert(key, value);
                }
            }
        }
        Ok(settings)
    }

    /// Returns a solver key that is not part of the grid section.
    pub fn entry(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// Reads a settings file into ordered key/value pairs.
pub fn read_values(path: &Path) -> Result<Vec<(String, String)>, ThawError> {
    let text = fs::read_to_string(path).map_err(|err| ThawError::io("settings_read", path, err))?;
    parse_values(&text)
}

/// Splits settings text into key/value pairs.
pub fn parse_values(text: &str) -> Result<Vec<(String, String)>, ThawError> {
    let mut pairs = Vec::new();
    for (lineno, raw) in text.lines().enumerate() {
        let line = match raw.find('#') {
            Some(idx) => &raw[..idx],
            None => raw,
        }
        .trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| {
            ThawError::Config(
                ErrorInfo::new("settings_syntax", "line has no '=' separator")
                    .with_context("line", (lineno + 1).to_string())
                    .with_hint("expected `key = value`"),
            )
        })?;
        pairs.push((key.trim().to_string(), value.trim().to_string()));
    }
    Ok(pairs)
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ThawError> {
    value.parse::<f64>().map_err(|err| {
        ThawError::Config(
            ErrorInfo::new("settings_number", err.to_string())
                .with_context("key", key)
                .with_context("value", value),
        )
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ThawError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ThawError::Config(
            ErrorInfo::new("settings_bool", "expected `true` or `false`")
                .with_context("key", key)
                .with_context("value", value),
        )),
    }
}
