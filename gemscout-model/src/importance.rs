//! Permutation feature importance.
#![forbid(unsafe_code)]

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::cv::{mean_and_std, mean_squared_error};
use crate::features::{FEATURE_NAMES, FeatureKind, FeatureRow, NUMERIC_FEATURES, feature_kind};
use crate::gbdt::GradientBoostedTrees;

/// Increase in mean squared error when one feature is shuffled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// Feature name from [`FEATURE_NAMES`].
    pub feature: String,
    /// Mean MSE increase over all repeats.
    pub mean: f64,
    /// Standard deviation of the MSE increase over all repeats.
    pub std: f64,
}

/// Score each feature by how much shuffling its column degrades the fit.
///
/// Every repeat draws a fresh permutation from a `ChaCha8` stream seeded
/// with `seed`, so results are reproducible. Importances are returned in
/// model feature order.
#[must_use]
pub fn permutation_importance(
    model: &GradientBoostedTrees,
    rows: &[FeatureRow],
    targets: &[f64],
    repeats: usize,
    seed: u64,
) -> Vec<FeatureImportance> {
    let baseline = mse(model, rows, targets);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..rows.len()).collect();
    FEATURE_NAMES
        .iter()
        .enumerate()
        .map(|(feature, name)| {
            let deltas: Vec<f64> = (0..repeats)
                .map(|_| {
                    order.shuffle(&mut rng);
                    let permuted = permute_feature(rows, &order, feature);
                    score_delta(mse(model, &permuted, targets), baseline)
                })
                .collect();
            let (mean, std) = mean_and_std(&deltas);
            FeatureImportance {
                feature: (*name).to_owned(),
                mean,
                std,
            }
        })
        .collect()
}

#[expect(clippy::float_arithmetic, reason = "importance is an MSE difference")]
fn score_delta(permuted: f64, baseline: f64) -> f64 {
    permuted - baseline
}

fn mse(model: &GradientBoostedTrees, rows: &[FeatureRow], targets: &[f64]) -> f64 {
    mean_squared_error(
        rows.iter()
            .zip(targets)
            .map(|(row, target)| (model.predict(row), *target)),
    )
}

/// Copy of `rows` where `feature` of row `i` comes from row `order[i]`.
fn permute_feature(rows: &[FeatureRow], order: &[usize], feature: usize) -> Vec<FeatureRow> {
    rows.iter()
        .zip(order)
        .map(|(row, &source)| {
            let mut permuted = *row;
            if let Some(donor) = rows.get(source) {
                copy_feature(&mut permuted, donor, feature);
            }
            permuted
        })
        .collect()
}

fn copy_feature(target: &mut FeatureRow, donor: &FeatureRow, feature: usize) {
    match feature_kind(feature) {
        FeatureKind::Numeric => copy_slot(&mut target.numeric, &donor.numeric, feature),
        FeatureKind::Categorical => copy_slot(
            &mut target.categorical,
            &donor.categorical,
            feature.saturating_sub(NUMERIC_FEATURES),
        ),
    }
}

fn copy_slot<T: Copy>(target: &mut [T], donor: &[T], slot: usize) {
    if let (Some(dst), Some(src)) = (target.get_mut(slot), donor.get(slot)) {
        *dst = *src;
    }
}
