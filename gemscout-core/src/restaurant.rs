//! Canonical restaurant records and their scored form.

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::listing::PriceLevel;
use crate::tier::ValueTier;

/// One unique establishment with every engineered feature populated.
///
/// Built by [`FeaturePipeline::build`](crate::FeaturePipeline::build) from validated,
/// deduplicated listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Display name; unique within a corpus.
    pub name: String,
    /// WGS84 position, `x = lon`, `y = lat`.
    pub location: Coord<f64>,
    /// Star rating in `1..=5`.
    pub rating: f64,
    /// Number of reviews.
    pub review_count: u64,
    /// Parsed price tier.
    pub price_level: Option<PriceLevel>,
    /// Category as listed, or deduced from the name.
    pub category: String,
    /// Source identifier.
    pub url: Option<String>,
    /// Zone name, the outside sentinel, or "Unknown" without zone data.
    pub planning_area: String,
    /// Other restaurants within the cluster radius.
    pub cluster_density: u32,
    /// Metres to the nearest facility of interest.
    pub dist_to_facility: f64,
    /// The name appears more often than the chain threshold.
    pub is_chain: bool,
    /// Within the adjacency threshold of a facility.
    pub is_facility_adjacent: bool,
    /// `ln(1 + review_count)`.
    pub log_reviews: f64,
    /// Category after collapsing everything outside the top-K into "Other".
    pub category_encoded: String,
    /// Price tier in `1..=4`; unknown tiers count as 1.
    pub price_level_num: u8,
}

impl Restaurant {
    /// `ln(1 + review_count)`, the review-volume feature.
    ///
    /// # Examples
    /// ```
    /// use gemscout_core::Restaurant;
    ///
    /// assert_eq!(Restaurant::log_reviews_for(0), 0.0);
    /// assert!((Restaurant::log_reviews_for(99) - 100_f64.ln()).abs() < 1e-12);
    /// ```
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "review counts are far below 2^52")]
    pub fn log_reviews_for(review_count: u64) -> f64 {
        (review_count as f64).ln_1p()
    }

    /// Numeric price feature; listings without a tier count as budget.
    #[must_use]
    pub fn price_level_num_for(price_level: Option<PriceLevel>) -> u8 {
        price_level.map_or(1, PriceLevel::as_number)
    }
}

/// A restaurant paired with the model's expectation for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRestaurant {
    /// The scored restaurant.
    pub restaurant: Restaurant,
    /// Rating the model expects for these features.
    pub predicted_rating: f64,
    /// `rating - predicted_rating`.
    pub residual: f64,
    /// Classification of the residual.
    pub value_tier: ValueTier,
}

impl ScoredRestaurant {
    /// Score `restaurant` against `predicted_rating`.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use gemscout_core::{Restaurant, ScoredRestaurant, ValueTier};
    ///
    /// let restaurant = Restaurant {
    ///     name: "Hill Street Tai Hwa".into(),
    ///     location: Coord { x: 103.86, y: 1.30 },
    ///     rating: 4.6,
    ///     review_count: 3_000,
    ///     price_level: None,
    ///     category: "Hawker".into(),
    ///     url: None,
    ///     planning_area: "Kallang".into(),
    ///     cluster_density: 12,
    ///     dist_to_facility: 80.0,
    ///     is_chain: false,
    ///     is_facility_adjacent: false,
    ///     log_reviews: Restaurant::log_reviews_for(3_000),
    ///     category_encoded: "Hawker".into(),
    ///     price_level_num: 1,
    /// };
    /// let scored = ScoredRestaurant::new(restaurant, 4.0);
    /// assert!((scored.residual - 0.6).abs() < 1e-9);
    /// assert_eq!(scored.value_tier, ValueTier::Gem);
    /// ```
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "residual is a rating difference")]
    pub fn new(restaurant: Restaurant, predicted_rating: f64) -> Self {
        let residual = restaurant.rating - predicted_rating;
        Self {
            value_tier: ValueTier::from_residual(residual),
            restaurant,
            predicted_rating,
            residual,
        }
    }

    /// Short badge text such as `Underrated +0.62`.
    #[must_use]
    pub fn badge(&self) -> String {
        crate::tier::badge(self.residual)
    }

    /// One-sentence explanation of the residual.
    #[must_use]
    pub fn explanation(&self) -> String {
        crate::tier::explain(&self.restaurant, self.predicted_rating, self.residual)
    }
}
