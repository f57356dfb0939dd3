//! Command-line interface for GemScout's batch scoring jobs.
//!
//! `score` trains the expectation model on a listings dump and writes the
//! scored dataset plus the model artefact; `rescore` reuses a saved
//! artefact to score new listings without retraining. Paths and tuning
//! values can come from CLI flags, configuration files, or `GEMSCOUT_*`
//! environment variables.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod inputs;
mod rescore;
mod score;
mod summary;

pub use error::CliError;

use rescore::{RescoreArgs, run_rescore};
use score::{ScoreArgs, run_score};

pub(crate) const ARG_LISTINGS: &str = "listings";
pub(crate) const ARG_ZONES: &str = "zones";
pub(crate) const ARG_FACILITIES: &str = "facilities";
pub(crate) const ARG_OUTPUT: &str = "output";
pub(crate) const ARG_MODEL: &str = "model";
pub(crate) const ARG_PIPELINE_CONFIG: &str = "pipeline-config";
pub(crate) const ARG_CV_FOLDS: &str = "cv-folds";
pub(crate) const ARG_TOP_K: &str = "top-k";
pub(crate) const ARG_CHAIN_THRESHOLD: &str = "chain-threshold";
pub(crate) const ENV_SCORE_LISTINGS: &str = "GEMSCOUT_CMDS_SCORE_LISTINGS";
pub(crate) const ENV_RESCORE_LISTINGS: &str = "GEMSCOUT_CMDS_RESCORE_LISTINGS";

/// Scored dataset written when `--output` is not given.
pub const DEFAULT_OUTPUT: &str = "scored_restaurants.json";
/// Model artefact written by `score` and read by `rescore` by default.
pub const DEFAULT_MODEL: &str = "gemscout_model.bin";

/// Run the GemScout CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when argument parsing, configuration, input reading,
/// model fitting, or output writing fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Score(args) => run_score(args),
        Command::Rescore(args) => run_rescore(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "gemscout",
    about = "Rank restaurants by how far their rating beats expectation",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Train the expectation model and write the scored dataset.
    Score(ScoreArgs),
    /// Score listings with a previously saved model.
    Rescore(RescoreArgs),
}

#[cfg(test)]
mod tests;
