//! Tunable parameters for the feature pipeline.
//!
//! Defaults are calibrated for Singapore: the bounding box covers the main
//! island and the border band guards against points scraped from Johor
//! Bahru across the Strait. Other deployments are expected to override the
//! bounds and the two nearest-zone thresholds.

use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

/// Label assigned to restaurants that no zone claims.
pub const DEFAULT_OUTSIDE_LABEL: &str = "Outside region";

/// Label assigned to every restaurant when no zone reference is loaded.
pub const UNKNOWN_AREA_LABEL: &str = "Unknown";

/// Category used for missing cuisines and for those outside the top-K.
pub const OTHER_CATEGORY: &str = "Other";

/// Axis-aligned WGS84 bounding box; bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge in degrees.
    pub min_lat: f64,
    /// Northern edge in degrees.
    pub max_lat: f64,
    /// Western edge in degrees.
    pub min_lon: f64,
    /// Eastern edge in degrees.
    pub max_lon: f64,
}

impl BoundingBox {
    /// Report whether `location` (`x = lon`, `y = lat`) lies inside the box.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use gemscout_core::BoundingBox;
    ///
    /// let bounds = BoundingBox::default();
    /// assert!(bounds.contains(Coord { x: 103.85, y: 1.30 }));
    /// assert!(!bounds.contains(Coord { x: 103.76, y: 1.50 }));
    /// ```
    #[must_use]
    pub fn contains(&self, location: Coord<f64>) -> bool {
        (self.min_lat..=self.max_lat).contains(&location.y)
            && (self.min_lon..=self.max_lon).contains(&location.x)
    }

    /// Centre of the box, used as the projection origin.
    #[must_use]
    pub fn centre(&self) -> Coord<f64> {
        self.to_rect().center()
    }

    /// Convert to a `geo` rectangle.
    #[must_use]
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_lon,
                y: self.min_lat,
            },
            Coord {
                x: self.max_lon,
                y: self.max_lat,
            },
        )
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_lat: 1.15,
            max_lat: 1.48,
            min_lon: 103.6,
            max_lon: 104.05,
        }
    }
}

/// Parameters for the tiered zone resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Unresolved points north of this latitude form the border band.
    pub border_split_lat: f64,
    /// Nearest-zone acceptance distance for the border band, in metres.
    pub border_threshold_m: f64,
    /// Nearest-zone acceptance distance for interior points, in metres.
    pub interior_threshold_m: f64,
    /// Points north of this latitude are always outside the region.
    pub hard_cutoff_lat: f64,
    /// Sentinel label for unresolved restaurants.
    pub outside_label: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            border_split_lat: 1.44,
            border_threshold_m: 100.0,
            interior_threshold_m: 2_000.0,
            hard_cutoff_lat: 1.47,
            outside_label: DEFAULT_OUTSIDE_LABEL.to_owned(),
        }
    }
}

/// Parameters for the proximity features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    /// A restaurant closer than this to a facility is facility-adjacent.
    pub adjacency_threshold_m: f64,
    /// Radius of the competitor count.
    pub cluster_radius_m: f64,
    /// Distance reported when no facility reference is available.
    pub missing_facility_distance_m: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            adjacency_threshold_m: 50.0,
            cluster_radius_m: 200.0,
            missing_facility_distance_m: 9_999.0,
        }
    }
}

/// Parameters for the categorical and chain features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Number of most frequent cuisines kept before collapsing to "Other".
    pub top_k_categories: usize,
    /// A name seen more than this many times marks a chain.
    pub chain_threshold: usize,
    /// Derive a cuisine from the name when a listing has no category.
    pub deduce_missing_cuisine: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            top_k_categories: 20,
            chain_threshold: 2,
            deduce_missing_cuisine: true,
        }
    }
}

/// Manual correction for a listing whose scraped pin is known to be wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateOverride {
    /// Case-insensitive substring matched against the listing name.
    pub name_contains: String,
    /// Corrected latitude.
    pub lat: f64,
    /// Corrected longitude.
    pub lon: f64,
}

/// Full configuration surface of the feature pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Listings outside this box are dropped.
    pub bounds: BoundingBox,
    /// Zone resolution thresholds.
    pub resolver: ResolverConfig,
    /// Facility and density radii.
    pub proximity: ProximityConfig,
    /// Chain and category settings.
    pub features: FeatureConfig,
    /// Applied in order; the first matching override wins.
    pub overrides: Vec<CoordinateOverride>,
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "tests fail loudly on setup errors")]

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Coord { x: 103.6, y: 1.15 })]
    #[case(Coord { x: 104.05, y: 1.48 })]
    fn bounds_are_inclusive(#[case] location: Coord<f64>) {
        assert!(BoundingBox::default().contains(location));
    }

    #[rstest]
    fn partial_config_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"resolver": {"border_threshold_m": 80.0}}"#)
                .expect("parse config");
        assert_eq!(config.resolver.border_threshold_m, 80.0);
        assert_eq!(config.resolver.interior_threshold_m, 2_000.0);
        assert_eq!(config.features.top_k_categories, 20);
        assert_eq!(config.bounds, BoundingBox::default());
    }
}
