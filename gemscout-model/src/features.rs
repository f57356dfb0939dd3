//! Numeric feature rows derived from restaurants.
#![forbid(unsafe_code)]

use gemscout_core::Restaurant;
use serde::{Deserialize, Serialize};

use crate::encoding::OrdinalEncoder;

/// Number of numeric features in a [`FeatureRow`].
pub const NUMERIC_FEATURES: usize = 4;

/// Number of categorical features in a [`FeatureRow`].
pub const CATEGORICAL_FEATURES: usize = 2;

/// Total number of model features.
pub const FEATURE_COUNT: usize = NUMERIC_FEATURES + CATEGORICAL_FEATURES;

/// Feature names in model order: numeric features first, then categorical.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "log_reviews",
    "price_level_num",
    "is_chain",
    "cluster_density",
    "category_encoded",
    "planning_area",
];

/// Whether a feature is split on thresholds or on category sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Ordered feature split on `value <= threshold`.
    Numeric,
    /// Unordered feature split on membership in a category set.
    Categorical,
}

/// Kind of feature `feature`, in model order.
#[must_use]
pub const fn feature_kind(feature: usize) -> FeatureKind {
    if feature < NUMERIC_FEATURES {
        FeatureKind::Numeric
    } else {
        FeatureKind::Categorical
    }
}

/// One encoded training or prediction row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// `log_reviews`, `price_level_num`, `is_chain`, `cluster_density`.
    pub numeric: [f64; NUMERIC_FEATURES],
    /// Codes for `category_encoded` and `planning_area`.
    pub categorical: [u32; CATEGORICAL_FEATURES],
}

impl FeatureRow {
    /// Numeric value of feature `feature`, if it is numeric.
    #[must_use]
    pub fn numeric_value(&self, feature: usize) -> Option<f64> {
        self.numeric.get(feature).copied()
    }

    /// Category code of feature `feature`, if it is categorical.
    #[must_use]
    pub fn category_code(&self, feature: usize) -> Option<u32> {
        feature
            .checked_sub(NUMERIC_FEATURES)
            .and_then(|slot| self.categorical.get(slot))
            .copied()
    }
}

/// Encoders for the categorical features, fitted on a training set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureEncoder {
    category: OrdinalEncoder,
    planning_area: OrdinalEncoder,
}

impl FeatureEncoder {
    /// Fit both categorical encoders on `restaurants`.
    #[must_use]
    pub fn fit(restaurants: &[Restaurant]) -> Self {
        Self {
            category: OrdinalEncoder::fit(restaurants.iter().map(|r| r.category_encoded.as_str())),
            planning_area: OrdinalEncoder::fit(
                restaurants.iter().map(|r| r.planning_area.as_str()),
            ),
        }
    }

    /// Encode one restaurant; unseen categories map to the unknown code.
    #[must_use]
    pub fn encode(&self, restaurant: &Restaurant) -> FeatureRow {
        FeatureRow {
            numeric: [
                restaurant.log_reviews,
                f64::from(restaurant.price_level_num),
                if restaurant.is_chain { 1.0 } else { 0.0 },
                f64::from(restaurant.cluster_density),
            ],
            categorical: [
                self.category.encode(&restaurant.category_encoded),
                self.planning_area.encode(&restaurant.planning_area),
            ],
        }
    }

    /// Encode every restaurant in order.
    #[must_use]
    pub fn encode_all(&self, restaurants: &[Restaurant]) -> Vec<FeatureRow> {
        restaurants.iter().map(|r| self.encode(r)).collect()
    }

    /// Encoder for `category_encoded`.
    #[must_use]
    pub const fn category(&self) -> &OrdinalEncoder {
        &self.category
    }

    /// Encoder for `planning_area`.
    #[must_use]
    pub const fn planning_area(&self) -> &OrdinalEncoder {
        &self.planning_area
    }
}
