//! The expectation model: encoders, trees and the schema they were fitted on.
#![forbid(unsafe_code)]

use std::time::{SystemTime, UNIX_EPOCH};

use gemscout_core::{Restaurant, ScoredRestaurant, apply_category_cap};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cv::{CvReport, cross_validate, root_mean_squared_error, targets};
use crate::error::ModelError;
use crate::features::{FeatureEncoder, FeatureRow};
use crate::gbdt::{GbdtParams, GradientBoostedTrees};
use crate::importance::{FeatureImportance, permutation_importance};

/// Training controls beyond the tree hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Gradient boosting hyperparameters.
    pub params: GbdtParams,
    /// Number of cross-validation folds; fewer than two skips validation.
    pub cv_folds: usize,
    /// Shuffles per feature when measuring permutation importance.
    pub importance_repeats: usize,
    /// Seed for the permutation importance RNG.
    pub importance_seed: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            params: GbdtParams::default(),
            cv_folds: 5,
            importance_repeats: 10,
            importance_seed: 42,
        }
    }
}

/// Feature-engineering choices a model depends on at prediction time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Cuisines kept verbatim in `category_encoded`; the rest become "Other".
    pub top_categories: Vec<String>,
    /// Occurrence count above which a name counts as a chain.
    pub chain_threshold: usize,
}

/// Provenance recorded alongside a fitted model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Version of the crate that fitted the model.
    pub version: String,
    /// Fit time in seconds since the Unix epoch.
    pub fitted_at_unix: u64,
    /// Number of restaurants in the production fit.
    pub training_rows: usize,
}

/// Diagnostics gathered while training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Rows in the production fit.
    pub rows: usize,
    /// In-sample RMSE of the production fit.
    pub training_rmse: f64,
    /// Cross-validation results, when there were enough rows.
    pub cv: Option<CvReport>,
    /// Permutation importance per feature, in model order.
    pub importances: Vec<FeatureImportance>,
}

/// Predicts the rating a restaurant "should" have given its context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationModel {
    encoder: FeatureEncoder,
    ensemble: GradientBoostedTrees,
    schema: FeatureSchema,
    params: GbdtParams,
    info: ModelInfo,
}

impl ExpectationModel {
    /// Cross-validate, then fit on the full corpus.
    ///
    /// Cross-validation runs first and never mutates `restaurants`; the
    /// production fit uses encoders fitted on every row.
    ///
    /// # Errors
    /// Returns [`ModelError::EmptyTrainingSet`] when `restaurants` is empty
    /// and [`ModelError::MissingTarget`] when a rating is not finite.
    pub fn train(
        restaurants: &[Restaurant],
        schema: FeatureSchema,
        settings: &ModelSettings,
    ) -> Result<(Self, TrainingSummary), ModelError> {
        if restaurants.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        let training_targets = targets(restaurants)?;
        let cv = cross_validate(restaurants, &settings.params, settings.cv_folds)?;

        let encoder = FeatureEncoder::fit(restaurants);
        let rows = encoder.encode_all(restaurants);
        let ensemble = GradientBoostedTrees::fit(&rows, &training_targets, &settings.params)?;
        let training_rmse = root_mean_squared_error(
            rows.iter()
                .zip(&training_targets)
                .map(|(row, target)| (ensemble.predict(row), *target)),
        );
        let importances = permutation_importance(
            &ensemble,
            &rows,
            &training_targets,
            settings.importance_repeats,
            settings.importance_seed,
        );
        info!(
            "fitted {} trees on {} restaurants (training RMSE {training_rmse:.4})",
            ensemble.trees().len(),
            restaurants.len()
        );

        let model = Self {
            encoder,
            ensemble,
            schema,
            params: settings.params,
            info: ModelInfo {
                version: env!("CARGO_PKG_VERSION").to_owned(),
                fitted_at_unix: unix_now(),
                training_rows: restaurants.len(),
            },
        };
        let summary = TrainingSummary {
            rows: restaurants.len(),
            training_rmse,
            cv,
            importances,
        };
        Ok((model, summary))
    }

    /// Expected rating for one restaurant, as encoded.
    #[must_use]
    pub fn predict(&self, restaurant: &Restaurant) -> f64 {
        self.predict_row(&self.encoder.encode(restaurant))
    }

    /// Expected rating for an already encoded row.
    #[must_use]
    pub fn predict_row(&self, row: &FeatureRow) -> f64 {
        self.ensemble.predict(row)
    }

    /// Re-apply this model's category cap, predict and rank every restaurant.
    ///
    /// Output order follows input order.
    #[must_use]
    pub fn score(&self, mut restaurants: Vec<Restaurant>) -> Vec<ScoredRestaurant> {
        apply_category_cap(&mut restaurants, &self.schema.top_categories);
        restaurants
            .into_par_iter()
            .map(|restaurant| {
                let predicted = self.predict(&restaurant);
                ScoredRestaurant::new(restaurant, predicted)
            })
            .collect()
    }

    /// Categorical encoders fitted on the training corpus.
    #[must_use]
    pub const fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Fitted tree ensemble.
    #[must_use]
    pub const fn ensemble(&self) -> &GradientBoostedTrees {
        &self.ensemble
    }

    /// Category cap and chain threshold the model was trained with.
    #[must_use]
    pub const fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Hyperparameters used for the production fit.
    #[must_use]
    pub const fn params(&self) -> &GbdtParams {
        &self.params
    }

    /// Fit provenance.
    #[must_use]
    pub const fn info(&self) -> &ModelInfo {
        &self.info
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
