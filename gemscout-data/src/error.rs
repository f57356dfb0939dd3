//! Error types produced while reading inputs and writing the scored dataset.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors produced by dataset readers and writers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DataError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that was being read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The file is not valid JSON of the expected shape.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File that was being parsed.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// A GeoJSON feature carries coordinates that do not match its type.
    #[error("feature {index} in {path} has malformed {kind} coordinates: {source}")]
    Geometry {
        /// GeoJSON file containing the feature.
        path: Utf8PathBuf,
        /// Position of the feature in the collection.
        index: usize,
        /// Declared geometry type.
        kind: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// Encoding the scored dataset failed.
    #[error("failed to encode scored dataset for {path}: {source}")]
    Encode {
        /// Destination file.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// Writing the scored dataset failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}
