//! Rescore command: score fresh listings with a saved model artefact.

use camino::Utf8PathBuf;
use clap::Parser;
use gemscout_core::ValueTier;
use gemscout_data::{ranked_records, write_scored};
use gemscout_model::load_model;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::inputs::{SourcePaths, build_features, load_pipeline_config, require_existing};
use crate::summary::{RunSummary, write_summary};
use crate::{
    ARG_FACILITIES, ARG_LISTINGS, ARG_MODEL, ARG_OUTPUT, ARG_PIPELINE_CONFIG, ARG_ZONES,
    CliError, DEFAULT_MODEL, DEFAULT_OUTPUT, ENV_RESCORE_LISTINGS,
};

/// CLI arguments for the `rescore` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Run the feature pipeline over new listings and score them \
                 with a model artefact written by `score`. The chain \
                 threshold and the kept cuisine categories come from the \
                 artefact so features match what the model was trained on.",
    about = "Score listings with a saved expectation model"
)]
#[ortho_config(prefix = "GEMSCOUT")]
pub(crate) struct RescoreArgs {
    /// Path to the JSON listings dump.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) listings: Option<Utf8PathBuf>,
    /// Administrative zone boundaries (GeoJSON).
    #[arg(long = ARG_ZONES, value_name = "path")]
    #[serde(default)]
    pub(crate) zones: Option<Utf8PathBuf>,
    /// Facilities of interest (GeoJSON).
    #[arg(long = ARG_FACILITIES, value_name = "path")]
    #[serde(default)]
    pub(crate) facilities: Option<Utf8PathBuf>,
    /// Where to write the scored dataset.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Model artefact to score with.
    #[arg(long = ARG_MODEL, value_name = "path")]
    #[serde(default)]
    pub(crate) model: Option<Utf8PathBuf>,
    /// JSON file with pipeline thresholds, bounds and coordinate overrides.
    #[arg(long = ARG_PIPELINE_CONFIG, value_name = "path")]
    #[serde(default)]
    pub(crate) pipeline_config: Option<Utf8PathBuf>,
}

impl RescoreArgs {
    pub(crate) fn into_config(self) -> Result<RescoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RescoreConfig::try_from(merged)
    }
}

/// Resolved `rescore` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RescoreConfig {
    pub(crate) sources: SourcePaths,
    pub(crate) output: Utf8PathBuf,
    pub(crate) model: Utf8PathBuf,
    pub(crate) pipeline_config: Option<Utf8PathBuf>,
}

impl TryFrom<RescoreArgs> for RescoreConfig {
    type Error = CliError;

    fn try_from(args: RescoreArgs) -> Result<Self, Self::Error> {
        let listings = args.listings.ok_or(CliError::MissingArgument {
            field: ARG_LISTINGS,
            env: ENV_RESCORE_LISTINGS,
        })?;
        Ok(Self {
            sources: SourcePaths {
                listings,
                zones: args.zones,
                facilities: args.facilities,
            },
            output: args
                .output
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT)),
            model: args.model.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_MODEL)),
            pipeline_config: args.pipeline_config,
        })
    }
}

pub(super) fn run_rescore(args: RescoreArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let summary = execute_rescore(&config)?;
    let mut stdout = std::io::stdout().lock();
    write_summary(&mut stdout, &summary)
}

pub(crate) fn execute_rescore(config: &RescoreConfig) -> Result<RunSummary, CliError> {
    config.sources.validate()?;
    require_existing(&config.model, ARG_MODEL)?;
    let model = load_model(&config.model)?;

    let mut pipeline = load_pipeline_config(config.pipeline_config.as_deref())?;
    pipeline.features.chain_threshold = model.schema().chain_threshold;
    let (restaurants, report) = build_features(pipeline, &config.sources)?;
    if restaurants.is_empty() {
        return Err(CliError::EmptyCorpus {
            path: config.sources.listings.clone(),
        });
    }

    let scored = model.score(restaurants);
    let records = ranked_records(&scored, model.info());
    write_scored(&config.output, &records)?;
    let summary = RunSummary::new(
        &report,
        &records,
        None,
        &model,
        config.output.clone(),
        config.model.clone(),
    );
    info!(
        "rescored {} restaurants ({} gems) with model {} fitted at {}",
        summary.restaurants_scored,
        summary.count(ValueTier::Gem),
        summary.model.version,
        summary.model.fitted_at_unix
    );
    Ok(summary)
}
