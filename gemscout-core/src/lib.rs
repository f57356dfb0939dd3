//! Core domain types and feature engineering for the GemScout engine.
//!
//! The crate turns scraped restaurant listings into feature-complete
//! [`Restaurant`] records: coordinates are validated and bounded, duplicate
//! scrapes collapsed, each restaurant assigned an administrative zone, and
//! distance features computed on a local metric projection. The residual
//! ranker ([`ValueTier`], [`ScoredRestaurant`]) lives here too so that
//! scoring stays independent of the model implementation.

mod config;
mod cuisine;
mod dedup;
mod features;
mod listing;
mod normalize;
mod projection;
mod proximity;
mod reference;
mod resolver;
mod restaurant;
mod tier;

#[doc(hidden)]
pub mod test_support;

pub use config::{
    BoundingBox, CoordinateOverride, DEFAULT_OUTSIDE_LABEL, FeatureConfig, OTHER_CATEGORY,
    PipelineConfig, ProximityConfig, ResolverConfig, UNKNOWN_AREA_LABEL,
};
pub use cuisine::deduce_cuisine;
pub use dedup::{UniqueListing, deduplicate};
pub use features::{
    FeaturePipeline, PipelineError, PipelineReport, apply_category_cap, top_categories,
};
pub use listing::{PriceLevel, RawListing};
pub use normalize::{
    DropReason, NormalizeReport, NormalizedListing, PinPattern, RATING_RANGE, normalize_listings,
};
pub use projection::LocalProjection;
pub use proximity::{FacilityIndex, FacilityProximity, cluster_densities, facility_proximity};
pub use reference::{AdministrativeZone, FacilityOfInterest};
pub use resolver::{ResolutionTier, ResolveReport, ZoneAssignment, ZoneIndex, resolve_areas};
pub use restaurant::{Restaurant, ScoredRestaurant};
pub use tier::{GEM_THRESHOLD, OVERVALUED_THRESHOLD, ValueTier, badge, explain};
