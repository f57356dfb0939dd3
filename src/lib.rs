//! Facade crate for the GemScout restaurant value engine.
//!
//! This crate re-exports the feature pipeline and residual ranker from
//! `gemscout-core`, the expectation model from `gemscout-model`, and, behind
//! the `data` feature, the file formats and dataset cache from
//! `gemscout-data`.

#![forbid(unsafe_code)]

pub use gemscout_core::{
    FeaturePipeline, PipelineConfig, PipelineError, PipelineReport, RawListing, Restaurant,
    ScoredRestaurant, ValueTier,
};

pub use gemscout_model::{
    ExpectationModel, FeatureSchema, ModelArtefactError, ModelError, ModelInfo, ModelSettings,
    StagedModel, TrainingSummary, load_model, save_model, stage_model,
};

#[cfg(feature = "data")]
pub use gemscout_data::{
    DataError, DatasetCache, ScoredDatasetCache, ScoredRecord, StagedDataset, ranked_records,
    read_facilities, read_listings, read_scored, read_zones, stage_scored, write_scored,
};
