//! Expectation model for GemScout restaurant scoring.
//!
//! The crate fits a least-squares gradient-boosted tree ensemble that
//! predicts the rating a restaurant would be expected to have given its
//! review volume, price tier, chain status, local competition, cuisine and
//! planning area. The difference between the actual and the predicted
//! rating is the residual that [`ScoredRestaurant`](gemscout_core::ScoredRestaurant)
//! ranks on.
//!
//! Training runs a k-fold cross-validation pass first, then fits on the
//! whole corpus and measures permutation importance. Fitted models can be
//! persisted with [`save_model`] and reloaded with [`load_model`] to score
//! new listings without retraining.
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8Path;
//! use gemscout_model::{ExpectationModel, FeatureSchema, ModelSettings, save_model};
//!
//! # fn restaurants() -> Vec<gemscout_core::Restaurant> { Vec::new() }
//! let corpus = restaurants();
//! let schema = FeatureSchema {
//!     top_categories: vec!["Japanese".to_owned()],
//!     chain_threshold: 2,
//! };
//! let (model, summary) = ExpectationModel::train(&corpus, schema, &ModelSettings::default())
//!     .expect("fit expectation model");
//! println!("training RMSE {:.3}", summary.training_rmse);
//! save_model(Utf8Path::new("artifacts/model.bin"), &model).expect("persist model");
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod artefact;
mod cv;
mod encoding;
mod error;
mod features;
mod gbdt;
mod importance;
mod model;

pub use artefact::{
    MODEL_FORMAT_VERSION, MODEL_MAGIC, StagedModel, load_model, save_model, stage_model,
};
pub use cv::{CvReport, cross_validate};
pub use encoding::{OrdinalEncoder, UNKNOWN_CATEGORY};
pub use error::{ModelArtefactError, ModelError};
pub use features::{
    CATEGORICAL_FEATURES, FEATURE_COUNT, FEATURE_NAMES, FeatureEncoder, FeatureKind, FeatureRow,
    NUMERIC_FEATURES, feature_kind,
};
pub use gbdt::{GbdtParams, GradientBoostedTrees, RegressionTree};
pub use importance::{FeatureImportance, permutation_importance};
pub use model::{ExpectationModel, FeatureSchema, ModelInfo, ModelSettings, TrainingSummary};
