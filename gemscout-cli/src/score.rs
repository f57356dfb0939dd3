//! Score command implementation for the GemScout CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use gemscout_core::{PipelineConfig, ValueTier};
use gemscout_data::{ranked_records, stage_scored};
use gemscout_model::{ExpectationModel, FeatureSchema, ModelSettings, stage_model};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::inputs::{SourcePaths, build_features, load_pipeline_config};
use crate::summary::{RunSummary, write_summary};
use crate::{
    ARG_CHAIN_THRESHOLD, ARG_CV_FOLDS, ARG_FACILITIES, ARG_LISTINGS, ARG_MODEL, ARG_OUTPUT,
    ARG_PIPELINE_CONFIG, ARG_TOP_K, ARG_ZONES, CliError, DEFAULT_MODEL, DEFAULT_OUTPUT,
    ENV_SCORE_LISTINGS,
};

/// CLI arguments for the `score` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Normalise and deduplicate a listings dump, derive location \
                 features from the zone and facility layers, cross-validate \
                 and fit the expectation model, then write the ranked scored \
                 dataset and the model artefact. Nothing is written when the \
                 model cannot be fitted.",
    about = "Train the expectation model and score every restaurant"
)]
#[ortho_config(prefix = "GEMSCOUT")]
pub(crate) struct ScoreArgs {
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
    /// Where to write the model artefact.
    #[arg(long = ARG_MODEL, value_name = "path")]
    #[serde(default)]
    pub(crate) model: Option<Utf8PathBuf>,
    /// JSON file with pipeline thresholds, bounds and coordinate overrides.
    #[arg(long = ARG_PIPELINE_CONFIG, value_name = "path")]
    #[serde(default)]
    pub(crate) pipeline_config: Option<Utf8PathBuf>,
    /// Number of cross-validation folds; below 2 skips validation.
    #[arg(long = ARG_CV_FOLDS, value_name = "n")]
    #[serde(default)]
    pub(crate) cv_folds: Option<usize>,
    /// Number of most frequent cuisines kept as distinct categories.
    #[arg(long = ARG_TOP_K, value_name = "n")]
    #[serde(default)]
    pub(crate) top_k: Option<usize>,
    /// A name seen more than this many times marks a chain.
    #[arg(long = ARG_CHAIN_THRESHOLD, value_name = "n")]
    #[serde(default)]
    pub(crate) chain_threshold: Option<usize>,
}

impl ScoreArgs {
    pub(crate) fn into_config(self) -> Result<ScoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScoreConfig::try_from(merged)
    }
}

/// Resolved `score` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScoreConfig {
    pub(crate) sources: SourcePaths,
    pub(crate) output: Utf8PathBuf,
    pub(crate) model: Utf8PathBuf,
    pub(crate) pipeline_config: Option<Utf8PathBuf>,
    pub(crate) cv_folds: usize,
    pub(crate) top_k: Option<usize>,
    pub(crate) chain_threshold: Option<usize>,
}

impl ScoreConfig {
    /// Pipeline configuration with the command-line overrides applied.
    pub(crate) fn pipeline(&self) -> Result<PipelineConfig, CliError> {
        let mut config = load_pipeline_config(self.pipeline_config.as_deref())?;
        if let Some(top_k) = self.top_k {
            config.features.top_k_categories = top_k;
        }
        if let Some(threshold) = self.chain_threshold {
            config.features.chain_threshold = threshold;
        }
        Ok(config)
    }

    fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            cv_folds: self.cv_folds,
            ..ModelSettings::default()
        }
    }
}

impl TryFrom<ScoreArgs> for ScoreConfig {
    type Error = CliError;

    fn try_from(args: ScoreArgs) -> Result<Self, Self::Error> {
        let listings = args.listings.ok_or(CliError::MissingArgument {
            field: ARG_LISTINGS,
            env: ENV_SCORE_LISTINGS,
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
            cv_folds: args
                .cv_folds
                .unwrap_or_else(|| ModelSettings::default().cv_folds),
            top_k: args.top_k,
            chain_threshold: args.chain_threshold,
        })
    }
}

pub(super) fn run_score(args: ScoreArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let summary = execute_score(&config)?;
    let mut stdout = std::io::stdout().lock();
    write_summary(&mut stdout, &summary)
}

/// Train, score and persist.
///
/// The model is fitted before anything is written, and both outputs are
/// staged before either replaces its predecessor, so an encoding or write
/// failure leaves the previous dataset and artefact paired.
pub(crate) fn execute_score(config: &ScoreConfig) -> Result<RunSummary, CliError> {
    config.sources.validate()?;
    let pipeline = config.pipeline()?;
    let chain_threshold = pipeline.features.chain_threshold;
    let (restaurants, report) = build_features(pipeline, &config.sources)?;

    let schema = FeatureSchema {
        top_categories: report.top_categories.clone(),
        chain_threshold,
    };
    let (model, training) =
        ExpectationModel::train(&restaurants, schema, &config.model_settings())?;
    let scored = model.score(restaurants);
    let records = ranked_records(&scored, model.info());

    let staged_dataset = stage_scored(&config.output, &records)?;
    let staged_model = stage_model(&config.model, &model)?;
    staged_model.commit()?;
    staged_dataset.commit()?;
    let summary = RunSummary::new(
        &report,
        &records,
        Some(training),
        &model,
        config.output.clone(),
        config.model.clone(),
    );
    info!(
        "scored {} restaurants ({} gems); model saved to {}",
        summary.restaurants_scored,
        summary.count(ValueTier::Gem),
        config.model
    );
    Ok(summary)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ScoreConfig, CliError> {
    let merged = ScoreArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ScoreConfig::try_from(merged)
}
