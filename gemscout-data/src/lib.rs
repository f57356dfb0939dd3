//! Data access for the GemScout engine.
//!
//! Responsibilities:
//! - Read scraped listings and reference GeoJSON into core types.
//! - Write the ranked, presentation-ready scored dataset.
//! - Cache the scored dataset for readers such as the map front-end.
//!
//! Boundaries:
//! - Do not encode domain rules (live in `gemscout-core`).
//! - Missing reference files degrade to empty collections; malformed ones
//!   are errors.
//!
//! Invariants:
//! - Output files are replaced atomically; a failed write leaves the
//!   previous file in place.
//! - No global mutable state.

mod cache;
mod error;
mod geojson;
mod listings;
mod output;

pub use cache::{DEFAULT_TTL, DatasetCache, ScoredDatasetCache};
pub use error::DataError;
pub use geojson::{NAME_KEYS, NamedGeometry, read_facilities, read_features, read_zones};
pub use listings::read_listings;
pub use output::{
    ScoredRecord, StagedDataset, ranked_records, read_scored, stage_scored, tier_counts,
    write_scored,
};

#[cfg(test)]
mod tests;
