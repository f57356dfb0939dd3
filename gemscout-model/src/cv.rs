//! K-fold cross-validation of the expectation model.
#![forbid(unsafe_code)]

use std::ops::Range;

use gemscout_core::Restaurant;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::features::FeatureEncoder;
use crate::gbdt::{GbdtParams, GradientBoostedTrees};

/// Root-mean-square error of each fold and their summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvReport {
    /// Validation RMSE per fold, in fold order.
    pub fold_rmse: Vec<f64>,
    /// Mean of [`CvReport::fold_rmse`].
    pub mean_rmse: f64,
    /// Population standard deviation of [`CvReport::fold_rmse`].
    pub std_rmse: f64,
}

/// Run contiguous k-fold cross-validation over `restaurants`.
///
/// Each fold refits the categorical encoders on its own training slice,
/// so validation rows can carry categories the fold never saw. Folds are
/// evaluated in parallel over shared, immutable input.
///
/// Returns `Ok(None)` when there are fewer than two folds or fewer rows
/// than folds; cross-validation is advisory and never blocks training.
///
/// # Errors
/// Returns [`ModelError::MissingTarget`] when a rating is not finite.
pub fn cross_validate(
    restaurants: &[Restaurant],
    params: &GbdtParams,
    folds: usize,
) -> Result<Option<CvReport>, ModelError> {
    if folds < 2 || restaurants.len() < folds {
        warn!(
            "skipping cross-validation: {} rows cannot fill {folds} folds",
            restaurants.len()
        );
        return Ok(None);
    }
    let ranges = fold_ranges(restaurants.len(), folds);
    let fold_rmse = ranges
        .par_iter()
        .map(|range| evaluate_fold(restaurants, range.clone(), params))
        .collect::<Result<Vec<f64>, ModelError>>()?;
    let (mean_rmse, std_rmse) = mean_and_std(&fold_rmse);
    info!("cross-validation over {folds} folds: RMSE {mean_rmse:.4} ± {std_rmse:.4}");
    Ok(Some(CvReport {
        fold_rmse,
        mean_rmse,
        std_rmse,
    }))
}

/// Contiguous fold boundaries; the first `len % folds` folds take one extra row.
pub(crate) fn fold_ranges(len: usize, folds: usize) -> Vec<Range<usize>> {
    let base = len.div_euclid(folds);
    let extra = len.rem_euclid(folds);
    let mut start = 0;
    (0..folds)
        .map(|fold| {
            let size = if fold < extra { base + 1 } else { base };
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}

fn evaluate_fold(
    restaurants: &[Restaurant],
    validation: Range<usize>,
    params: &GbdtParams,
) -> Result<f64, ModelError> {
    let (train_pairs, held_out): (Vec<(usize, &Restaurant)>, Vec<(usize, &Restaurant)>) =
        restaurants
            .iter()
            .enumerate()
            .partition(|(index, _)| !validation.contains(index));
    let train: Vec<Restaurant> = train_pairs.into_iter().map(|(_, r)| r.clone()).collect();
    let encoder = FeatureEncoder::fit(&train);
    let rows = encoder.encode_all(&train);
    let train_targets = targets(&train)?;
    let model = GradientBoostedTrees::fit(&rows, &train_targets, params)?;
    let pairs = held_out
        .into_iter()
        .map(|(_, r)| (model.predict(&encoder.encode(r)), r.rating));
    Ok(root_mean_squared_error(pairs))
}

/// Ratings of `restaurants` as regression targets.
pub(crate) fn targets(restaurants: &[Restaurant]) -> Result<Vec<f64>, ModelError> {
    restaurants
        .iter()
        .map(|r| {
            if r.rating.is_finite() {
                Ok(r.rating)
            } else {
                Err(ModelError::MissingTarget {
                    name: r.name.clone(),
                })
            }
        })
        .collect()
}

/// Mean squared error over `(prediction, actual)` pairs; zero when empty.
#[expect(clippy::float_arithmetic, reason = "error metric")]
pub(crate) fn mean_squared_error<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (sum, count) = pairs
        .into_iter()
        .fold((0.0, 0.0), |(sum, count), (predicted, actual)| {
            let diff = predicted - actual;
            (sum + diff * diff, count + 1.0)
        });
    if count > 0.0 { sum / count } else { 0.0 }
}

/// Root of [`mean_squared_error`].
pub(crate) fn root_mean_squared_error<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    mean_squared_error(pairs).sqrt()
}

/// Mean and population standard deviation; zeros when empty.
#[expect(clippy::float_arithmetic, reason = "summary statistics")]
pub(crate) fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let count = values.iter().fold(0.0, |count, _| count + 1.0);
    let mean = values.iter().sum::<f64>() / count;
    let variance = values
        .iter()
        .map(|value| (value - mean) * (value - mean))
        .sum::<f64>()
        / count;
    (mean, variance.sqrt())
}
