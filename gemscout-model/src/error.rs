//! Error types raised while fitting or persisting the expectation model.
#![forbid(unsafe_code)]

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while fitting the expectation model.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    /// No restaurants were supplied for training.
    #[error("cannot fit the expectation model on an empty training set")]
    EmptyTrainingSet,
    /// A training row has no usable rating target.
    #[error("restaurant {name:?} has a non-finite rating and cannot be a training target")]
    MissingTarget {
        /// Name of the offending restaurant.
        name: String,
    },
}

/// Errors raised while saving or loading a model artefact.
#[derive(Debug, Error)]
pub enum ModelArtefactError {
    /// Writing the artefact failed.
    #[error("failed to write model artefact at {path}")]
    Write {
        /// Target file path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Reading the artefact failed.
    #[error("failed to read model artefact at {path}")]
    Read {
        /// Source file path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Serialising the model to `bincode` failed.
    #[error("failed to serialise model into {path}")]
    Serialise {
        /// Target file path.
        path: Utf8PathBuf,
        /// Source error from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// Decoding the artefact body failed.
    #[error("failed to decode model artefact at {path}")]
    Deserialise {
        /// Source file path.
        path: Utf8PathBuf,
        /// Source error from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// The file does not start with the artefact magic bytes.
    #[error("{path} is not a model artefact (expected magic {expected:?}, found {found:?})")]
    InvalidMagic {
        /// Source file path.
        path: Utf8PathBuf,
        /// Magic bytes written by this crate.
        expected: [u8; 4],
        /// Bytes found at the start of the file.
        found: [u8; 4],
    },
    /// The artefact was written by an incompatible format version.
    #[error("model artefact at {path} has format version {found}; supported version is {supported}")]
    UnsupportedVersion {
        /// Source file path.
        path: Utf8PathBuf,
        /// Version found in the header.
        found: u16,
        /// Version this crate reads and writes.
        supported: u16,
    },
}
