//! Error types emitted by the GemScout CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use gemscout_core::PipelineError;
use gemscout_data::DataError;
use gemscout_model::{ModelArtefactError, ModelError};
use thiserror::Error;

/// Errors emitted by the GemScout CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without the leading dashes.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk or is not a file.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        /// Input the path was given for.
        field: &'static str,
        /// Path as configured.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Input the path was given for.
        field: &'static str,
        /// Path as configured.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Reading the pipeline configuration file failed.
    #[error("failed to read pipeline configuration at {path:?}: {source}")]
    ReadPipelineConfig {
        /// Configuration file location.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The pipeline configuration file is not valid JSON for the pipeline.
    #[error("failed to parse pipeline configuration at {path:?}: {source}")]
    ParsePipelineConfig {
        /// Configuration file location.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Reading inputs or writing the scored dataset failed.
    #[error(transparent)]
    Data(#[from] DataError),
    /// The feature pipeline could not be assembled.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// Fitting the expectation model failed; nothing was written.
    #[error("model fit failed: {0}")]
    ModelFit(#[from] ModelError),
    /// No listing survived the feature pipeline; the previous dataset is kept.
    #[error("no restaurants left to score from {path:?}")]
    EmptyCorpus {
        /// Listings dump that produced no restaurants.
        path: Utf8PathBuf,
    },
    /// Saving or loading the model artefact failed.
    #[error(transparent)]
    ModelArtefact(#[from] ModelArtefactError),
    /// Serialising the run summary failed.
    #[error("failed to serialise run summary: {0}")]
    SerialiseSummary(#[source] serde_json::Error),
    /// Writing the run summary failed.
    #[error("failed to write run summary: {0}")]
    WriteSummary(#[source] std::io::Error),
}
