//! Headerless binary `f64` arrays, the exchange format of the solver.
//!
//! Values are stored back to back as little-endian IEEE-754 doubles with no
//! length prefix, so the element count is the file size divided by eight.

use std::fs;
use std::path::Path;

use crate::errors::{ErrorInfo, ThawError};

const F64_WIDTH: usize = std::mem::size_of::<f64>();

/// Decodes a raw byte buffer into doubles.
pub fn decode_f64s(bytes: &[u8]) -> Result<Vec<f64>, ThawError> {
    if bytes.len() % F64_WIDTH != 0 {
        return Err(ThawError::Io(
            ErrorInfo::new("raw_truncated", "byte length is not a multiple of 8")
                .with_context("bytes", bytes.len().to_string()),
        ));
    }
    Ok(bytes
        .chunks_exact(F64_WIDTH)
        .map(|chunk| {
            let mut word = [0u8; F64_WIDTH];
            word.copy_from_slice(chunk);
            f64::from_le_bytes(word)
        })
        .collect())
}

/// Encodes doubles into the raw byte layout.
pub fn encode_f64s(values: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * F64_WIDTH);
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Reads a whole raw array file.
pub fn read_f64_file(path: &Path) -> Result<Vec<f64>, ThawError> {
    let bytes = fs::read(path).map_err(|err| ThawError::io("raw_read", path, err))?;
    decode_f64s(&bytes).map_err(|err| match err {
        ThawError::Io(info) => {
            ThawError::Io(info.with_context("path", path.display().to_string()))
        }
        other => other,
    })
}

/// Writes a raw array file, replacing any previous content.
pub fn write_f64_file(path: &Path, values: &[f64]) -> Result<(), ThawError> {
    fs::write(path, encode_f64s(values)).map_err(|err| ThawError::io("raw_write", path, err))
}
