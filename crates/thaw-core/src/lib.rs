#![deny(missing_docs)]
#![doc = "Shared error surface, solver settings and raw array I/O for the thaw workspace."]

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod io;
pub mod settings;

pub use errors::{ErrorInfo, ThawError};
pub use io::{read_f64_file, write_f64_file};
pub use settings::{GridSettings, Settings};

/// Identifier of a trial within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrialId(u64);

impl TrialId {
    /// Creates a new identifier from its raw integer representation.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TrialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
