//! Ingestion pipeline from raw listings to feature-complete restaurants.

use std::collections::HashMap;

use log::info;
use thiserror::Error;

use crate::config::{OTHER_CATEGORY, PipelineConfig};
use crate::dedup::deduplicate;
use crate::listing::RawListing;
use crate::normalize::{NormalizeReport, PinPattern, normalize_listings};
use crate::projection::LocalProjection;
use crate::proximity::{FacilityIndex, cluster_densities, facility_proximity};
use crate::reference::{AdministrativeZone, FacilityOfInterest};
use crate::resolver::{ResolveReport, ZoneIndex, resolve_areas};
use crate::restaurant::Restaurant;

/// Errors raised while preparing the feature pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The URL pin expression failed to compile.
    #[error("failed to compile pin coordinate pattern: {0}")]
    PinPattern(#[from] regex::Error),
}

/// Stage counts for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineReport {
    /// Normalization counts.
    pub normalize: NormalizeReport,
    /// Listings removed as duplicates of a more-reviewed one.
    pub duplicates_collapsed: usize,
    /// Zone resolution counts.
    pub resolve: ResolveReport,
    /// Restaurants flagged as chains.
    pub chains: usize,
    /// The top-K categories kept by the cap, most frequent first.
    pub top_categories: Vec<String>,
}

/// Holds the reference indexes and configuration shared by every run.
///
/// Indexes are built once in [`FeaturePipeline::new`] and only read
/// afterwards.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: PipelineConfig,
    pins: PinPattern,
    projection: LocalProjection,
    zones: ZoneIndex,
    facilities: FacilityIndex,
}

impl FeaturePipeline {
    /// Build the pipeline and index the reference data.
    ///
    /// Empty `zones` or `facilities` are accepted; the affected features
    /// degrade to constants when [`FeaturePipeline::build`] runs.
    ///
    /// # Errors
    /// Returns [`PipelineError::PinPattern`] if the pin expression cannot be
    /// compiled.
    pub fn new(
        config: PipelineConfig,
        zones: &[AdministrativeZone],
        facilities: &[FacilityOfInterest],
    ) -> Result<Self, PipelineError> {
        let projection = LocalProjection::centred_on(config.bounds.centre());
        Ok(Self {
            pins: PinPattern::compile()?,
            zones: ZoneIndex::new(zones, projection),
            facilities: FacilityIndex::new(facilities, projection),
            projection,
            config,
        })
    }

    /// Configuration the pipeline was built with.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Turn raw listings into one feature-complete restaurant per name.
    ///
    /// Categories outside the corpus's own top-K collapse to "Other"; use
    /// [`apply_category_cap`] to re-apply a trained model's list instead.
    ///
    /// # Examples
    /// ```
    /// use gemscout_core::{FeaturePipeline, PipelineConfig, RawListing};
    ///
    /// let pipeline = FeaturePipeline::new(PipelineConfig::default(), &[], &[]).unwrap();
    /// let (restaurants, report) = pipeline.build(vec![
    ///     RawListing::new("A", 1.30, 103.85, 4.1).with_review_count(10),
    ///     RawListing::new("A", 1.30, 103.85, 4.4).with_review_count(50),
    /// ]);
    /// assert_eq!(restaurants.len(), 1);
    /// assert_eq!(restaurants[0].review_count, 50);
    /// assert_eq!(restaurants[0].planning_area, "Unknown");
    /// assert_eq!(report.duplicates_collapsed, 1);
    /// ```
    #[must_use]
    pub fn build(&self, listings: Vec<RawListing>) -> (Vec<Restaurant>, PipelineReport) {
        let (normalized, normalize) = normalize_listings(listings, &self.config, &self.pins);
        let unique = deduplicate(normalized);
        let duplicates_collapsed = normalize.kept - unique.len();

        let locations: Vec<_> = unique.iter().map(|entry| entry.listing.location).collect();
        let (zones, resolve) = resolve_areas(&locations, &self.zones, &self.config.resolver);
        let proximity = facility_proximity(&locations, &self.facilities, &self.config.proximity);
        let densities = cluster_densities(
            &locations,
            &self.projection,
            self.config.proximity.cluster_radius_m,
        );

        let chain_threshold = self.config.features.chain_threshold;
        let mut restaurants: Vec<Restaurant> = unique
            .into_iter()
            .zip(zones)
            .zip(proximity)
            .zip(densities)
            .map(|(((entry, zone), near), cluster_density)| {
                let listing = entry.listing;
                Restaurant {
                    log_reviews: Restaurant::log_reviews_for(listing.review_count),
                    price_level_num: Restaurant::price_level_num_for(listing.price_level),
                    is_chain: entry.occurrences > chain_threshold,
                    category_encoded: listing.category.clone(),
                    planning_area: zone.planning_area,
                    cluster_density,
                    dist_to_facility: near.dist_to_facility,
                    is_facility_adjacent: near.is_facility_adjacent,
                    name: listing.name,
                    location: listing.location,
                    rating: listing.rating,
                    review_count: listing.review_count,
                    price_level: listing.price_level,
                    category: listing.category,
                    url: listing.url,
                }
            })
            .collect();

        let top_categories = top_categories(
            restaurants.iter().map(|r| r.category.as_str()),
            self.config.features.top_k_categories,
        );
        apply_category_cap(&mut restaurants, &top_categories);

        let chains = restaurants.iter().filter(|r| r.is_chain).count();
        info!(
            "built features for {} restaurants ({chains} chains, {} categories kept)",
            restaurants.len(),
            top_categories.len()
        );
        let report = PipelineReport {
            normalize,
            duplicates_collapsed,
            resolve,
            chains,
            top_categories,
        };
        (restaurants, report)
    }
}

/// The `k` most frequent categories, most frequent first.
///
/// Equal counts are ordered by name so the selection is deterministic.
///
/// # Examples
/// ```
/// use gemscout_core::top_categories;
///
/// let top = top_categories(["Thai", "Cafe", "Thai", "Malay", "Cafe", "Indian"], 3);
/// assert_eq!(top, ["Cafe", "Thai", "Indian"]);
/// ```
#[must_use]
pub fn top_categories<'a, I>(categories: I, k: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for category in categories {
        *counts.entry(category).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(k)
        .map(|(category, _)| category.to_owned())
        .collect()
}

/// Set each restaurant's `category_encoded` to its category when listed in
/// `kept`, else "Other".
pub fn apply_category_cap(restaurants: &mut [Restaurant], kept: &[String]) {
    for restaurant in restaurants {
        restaurant.category_encoded = if kept.iter().any(|k| *k == restaurant.category) {
            restaurant.category.clone()
        } else {
            OTHER_CATEGORY.to_owned()
        };
    }
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        clippy::indexing_slicing,
        reason = "tests fail loudly on setup errors and index known-length results"
    )]

    use super::*;
    use crate::test_support::{restaurant_at, square_zone};
    use geo::Coord;
    use rstest::{fixture, rstest};

    #[fixture]
    fn pipeline() -> FeaturePipeline {
        let zones = [square_zone("X", 103.84, 1.29, 0.02)];
        let facilities = [FacilityOfInterest::new("Hawker", Coord { x: 103.85, y: 1.30 })];
        FeaturePipeline::new(PipelineConfig::default(), &zones, &facilities)
            .expect("pipeline builds")
    }

    #[rstest]
    fn chains_are_counted_before_deduplication(pipeline: FeaturePipeline) {
        let listings: Vec<_> = (0..3)
            .map(|i| RawListing::new("Toast Box", 1.30, 103.85, 3.8).with_review_count(i))
            .chain([
                RawListing::new("Ya Kun", 1.30, 103.85, 3.9),
                RawListing::new("Ya Kun", 1.30, 103.85, 3.9),
            ])
            .collect();
        let (restaurants, report) = pipeline.build(listings);
        let chain: Vec<_> = restaurants.iter().map(|r| (r.name.as_str(), r.is_chain)).collect();
        assert_eq!(chain, [("Toast Box", true), ("Ya Kun", false)]);
        assert_eq!(report.chains, 1);
        assert_eq!(report.duplicates_collapsed, 3);
    }

    #[rstest]
    fn features_are_populated(pipeline: FeaturePipeline) {
        let (restaurants, _) = pipeline.build(vec![
            RawListing::new("Near", 1.30, 103.85, 4.2)
                .with_review_count(99)
                .with_price_level("$$$")
                .with_category("Thai"),
        ]);
        let only = restaurants.first().expect("restaurant built");
        assert_eq!(only.planning_area, "X");
        assert_eq!(only.cluster_density, 0);
        assert!(only.dist_to_facility < 1e-6);
        assert!(only.is_facility_adjacent);
        assert!((only.log_reviews - 100_f64.ln()).abs() < 1e-12);
        assert_eq!(only.price_level_num, 3);
        assert_eq!(only.category_encoded, "Thai");
    }

    #[rstest]
    fn categories_outside_top_k_collapse_to_other() {
        let config = PipelineConfig {
            features: crate::config::FeatureConfig {
                top_k_categories: 1,
                ..Default::default()
            },
            ..PipelineConfig::default()
        };
        let pipeline = FeaturePipeline::new(config, &[], &[]).expect("pipeline builds");
        let (restaurants, report) = pipeline.build(vec![
            RawListing::new("a", 1.30, 103.85, 4.0).with_category("Thai"),
            RawListing::new("b", 1.30, 103.85, 4.0).with_category("Thai"),
            RawListing::new("c", 1.30, 103.85, 4.0).with_category("Malay"),
        ]);
        let encoded: Vec<_> = restaurants.iter().map(|r| r.category_encoded.as_str()).collect();
        assert_eq!(encoded, ["Thai", "Thai", OTHER_CATEGORY]);
        assert_eq!(report.top_categories, ["Thai"]);
    }

    #[rstest]
    fn cap_uses_supplied_list() {
        let mut restaurants = vec![
            restaurant_at("a", Coord { x: 103.85, y: 1.30 }),
            restaurant_at("b", Coord { x: 103.85, y: 1.30 }),
        ];
        restaurants[0].category = "Korean".into();
        restaurants[1].category = "Peranakan".into();
        apply_category_cap(&mut restaurants, &["Korean".to_owned()]);
        assert_eq!(restaurants[0].category_encoded, "Korean");
        assert_eq!(restaurants[1].category_encoded, OTHER_CATEGORY);
    }
}
