//! Residual tiers and the presentation fields derived from them.

use serde::{Deserialize, Serialize};

use crate::config::OTHER_CATEGORY;
use crate::restaurant::Restaurant;

/// Residual at or above which a restaurant is a gem.
pub const GEM_THRESHOLD: f64 = 0.5;

/// Residual at or below which a restaurant is overvalued.
pub const OVERVALUED_THRESHOLD: f64 = -0.5;

/// Value classification of a residual.
///
/// | residual | tier |
/// |---|---|
/// | `r >= 0.5` | [`ValueTier::Gem`] |
/// | `0 < r < 0.5` | [`ValueTier::FairAbove`] |
/// | `-0.5 < r <= 0` | [`ValueTier::FairBelow`] |
/// | `r <= -0.5` | [`ValueTier::Overvalued`] |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTier {
    /// Residual at or above the gem threshold.
    Gem,
    /// Slightly better than expected.
    FairAbove,
    /// Slightly worse than expected, or exactly as expected.
    FairBelow,
    /// Residual at or below the overvalued threshold.
    Overvalued,
}

impl ValueTier {
    /// Classify a residual.
    ///
    /// # Examples
    /// ```
    /// use gemscout_core::ValueTier;
    ///
    /// assert_eq!(ValueTier::from_residual(0.5), ValueTier::Gem);
    /// assert_eq!(ValueTier::from_residual(0.0), ValueTier::FairBelow);
    /// assert_eq!(ValueTier::from_residual(-0.5), ValueTier::Overvalued);
    /// ```
    #[must_use]
    pub fn from_residual(residual: f64) -> Self {
        if residual >= GEM_THRESHOLD {
            Self::Gem
        } else if residual > 0.0 {
            Self::FairAbove
        } else if residual > OVERVALUED_THRESHOLD {
            Self::FairBelow
        } else {
            Self::Overvalued
        }
    }

    /// Human-readable tier name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gem => "Gem",
            Self::FairAbove => "Fair value, above expectation",
            Self::FairBelow => "Fair value, below expectation",
            Self::Overvalued => "Overvalued",
        }
    }

    /// Map marker colour as `[r, g, b, a]`.
    #[must_use]
    pub const fn rgba(self) -> [u8; 4] {
        match self {
            Self::Gem => [42, 157, 143, 200],
            Self::FairAbove => [233, 196, 106, 200],
            Self::FairBelow => [244, 162, 97, 200],
            Self::Overvalued => [231, 111, 81, 200],
        }
    }

    /// Opaque CSS colour matching [`ValueTier::rgba`].
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Gem => "#2a9d8f",
            Self::FairAbove => "#e9c46a",
            Self::FairBelow => "#f4a261",
            Self::Overvalued => "#e76f51",
        }
    }
}

impl std::fmt::Display for ValueTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Badge text for a residual, signed and rounded to two places.
///
/// # Examples
/// ```
/// use gemscout_core::badge;
///
/// assert_eq!(badge(0.618), "Underrated +0.62");
/// assert_eq!(badge(0.0), "Underrated +0.00");
/// assert_eq!(badge(-0.31), "Overrated -0.31");
/// ```
#[must_use]
pub fn badge(residual: f64) -> String {
    if residual >= 0.0 {
        format!("Underrated +{residual:.2}")
    } else {
        format!("Overrated {residual:.2}")
    }
}

fn factors(restaurant: &Restaurant) -> Vec<String> {
    let mut factors = Vec::new();
    if restaurant.category_encoded != OTHER_CATEGORY {
        factors.push(format!("{} cuisine", restaurant.category_encoded));
    }
    match restaurant.review_count {
        0..20 => factors.push("very few reviews".to_owned()),
        20..100 => factors.push(format!("{} reviews", restaurant.review_count)),
        count if count > 500 => factors.push(format!("high popularity ({count} reviews)")),
        _ => {}
    }
    match restaurant.cluster_density {
        0..5 => factors.push("low competition nearby".to_owned()),
        density if density > 40 => factors.push("highly competitive area".to_owned()),
        _ => {}
    }
    factors
}

/// One-sentence explanation of how a rating compares with its expectation.
#[must_use]
pub fn explain(restaurant: &Restaurant, predicted_rating: f64, residual: f64) -> String {
    let factors = factors(restaurant);
    let context = if factors.is_empty() {
        "its profile".to_owned()
    } else {
        factors.join(", ")
    };
    let actual = restaurant.rating;
    let area = &restaurant.planning_area;
    if residual >= GEM_THRESHOLD {
        format!(
            "With {context}, comparable places in {area} average {predicted_rating:.1}★; \
             at {actual:.1}★ this one clearly beats expectations."
        )
    } else if residual > 0.1 {
        format!(
            "Given {context}, the expected rating is {predicted_rating:.1}★; \
             at {actual:.1}★ it is doing better than average."
        )
    } else if residual > -0.1 {
        format!(
            "At {actual:.1}★ the rating matches the {predicted_rating:.1}★ expected for {context}."
        )
    } else if residual > OVERVALUED_THRESHOLD {
        format!(
            "Given {context}, comparable places score {predicted_rating:.1}★; \
             at {actual:.1}★ this one is slightly below expectations."
        )
    } else {
        format!(
            "With {context}, the expected rating is {predicted_rating:.1}★; \
             at {actual:.1}★ it underperforms its peers."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::restaurant_at;
    use geo::Coord;
    use rstest::rstest;

    #[rstest]
    #[case(0.75, ValueTier::Gem)]
    #[case(0.5, ValueTier::Gem)]
    #[case(0.499_999, ValueTier::FairAbove)]
    #[case(f64::MIN_POSITIVE, ValueTier::FairAbove)]
    #[case(0.0, ValueTier::FairBelow)]
    #[case(-0.0, ValueTier::FairBelow)]
    #[case(-0.499_999, ValueTier::FairBelow)]
    #[case(-0.5, ValueTier::Overvalued)]
    #[case(-2.0, ValueTier::Overvalued)]
    fn tier_boundaries(#[case] residual: f64, #[case] expected: ValueTier) {
        assert_eq!(ValueTier::from_residual(residual), expected);
    }

    #[rstest]
    #[case(ValueTier::Gem, "#2a9d8f", [42, 157, 143, 200])]
    #[case(ValueTier::Overvalued, "#e76f51", [231, 111, 81, 200])]
    fn colours_match_between_formats(
        #[case] tier: ValueTier,
        #[case] hex: &str,
        #[case] rgba: [u8; 4],
    ) {
        assert_eq!(tier.hex(), hex);
        assert_eq!(tier.rgba(), rgba);
        let [r, g, b, _] = rgba;
        assert_eq!(format!("#{r:02x}{g:02x}{b:02x}"), hex);
    }

    #[rstest]
    fn explanation_names_factors() {
        let mut restaurant = restaurant_at("Kopi Place", Coord { x: 103.85, y: 1.30 });
        restaurant.category_encoded = "Cafe".into();
        restaurant.review_count = 12;
        restaurant.cluster_density = 2;
        restaurant.rating = 4.7;
        restaurant.planning_area = "Outram".into();
        let text = explain(&restaurant, 4.0, 0.7);
        assert!(text.contains("Cafe cuisine, very few reviews, low competition nearby"));
        assert!(text.contains("Outram"));
        assert!(text.contains("4.7★"));
    }

    #[rstest]
    fn explanation_falls_back_to_profile() {
        let mut restaurant = restaurant_at("Plain", Coord { x: 103.85, y: 1.30 });
        restaurant.category_encoded = OTHER_CATEGORY.into();
        restaurant.review_count = 250;
        restaurant.cluster_density = 10;
        let text = explain(&restaurant, 4.0, 0.0);
        assert!(text.contains("its profile"), "{text}");
    }

    #[rstest]
    fn popular_venues_report_review_volume() {
        let mut restaurant = restaurant_at("Busy", Coord { x: 103.85, y: 1.30 });
        restaurant.review_count = 1_200;
        restaurant.cluster_density = 55;
        let text = explain(&restaurant, 4.4, -0.6);
        assert!(text.contains("high popularity (1200 reviews)"), "{text}");
        assert!(text.contains("highly competitive area"), "{text}");
    }
}
