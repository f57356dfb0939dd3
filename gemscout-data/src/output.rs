//! The scored dataset consumed by the map front-end.

use camino::{Utf8Path, Utf8PathBuf};
use gemscout_core::{ScoredRestaurant, ValueTier};
use gemscout_fs::{StagedFile, read_bytes, stage_atomic};
use gemscout_model::ModelInfo;
use log::info;
use serde::{Deserialize, Serialize};

use crate::DataError;

/// One row of the scored dataset, flattened for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// Display name.
    pub name: String,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Star rating.
    pub rating: f64,
    /// Number of reviews.
    pub review_count: u64,
    /// Dollar-sign price tier, when advertised.
    pub price_level: Option<String>,
    /// Listed or deduced cuisine.
    pub category: String,
    /// Cuisine as the model saw it.
    pub category_encoded: String,
    /// Source identifier.
    pub url: Option<String>,
    /// Zone name or sentinel label.
    pub planning_area: String,
    /// Other restaurants within the cluster radius.
    pub cluster_density: u32,
    /// Metres to the nearest facility of interest.
    pub dist_to_facility: f64,
    /// Flagged as a chain.
    pub is_chain: bool,
    /// Next to a facility of interest.
    pub is_facility_adjacent: bool,
    /// Rating the model expected.
    pub predicted_rating: f64,
    /// `rating - predicted_rating`.
    pub residual: f64,
    /// Residual tier.
    pub value_tier: ValueTier,
    /// Human-readable tier name.
    pub tier_label: String,
    /// RGBA marker colour.
    pub color: [u8; 4],
    /// Marker colour as `#rrggbb`.
    pub hex_color: String,
    /// Short label shown on the marker.
    pub badge: String,
    /// One-sentence reason for the tier.
    pub explanation: String,
    /// Version of the model that scored the row.
    pub model_version: String,
    /// Seconds since the Unix epoch when the scoring model was fitted.
    pub model_fitted_at: u64,
}

impl ScoredRecord {
    /// Flatten a scored restaurant and stamp it with model provenance.
    #[must_use]
    pub fn from_scored(scored: &ScoredRestaurant, model: &ModelInfo) -> Self {
        let restaurant = &scored.restaurant;
        Self {
            name: restaurant.name.clone(),
            latitude: restaurant.location.y,
            longitude: restaurant.location.x,
            rating: restaurant.rating,
            review_count: restaurant.review_count,
            price_level: restaurant.price_level.map(|level| level.as_str().to_owned()),
            category: restaurant.category.clone(),
            category_encoded: restaurant.category_encoded.clone(),
            url: restaurant.url.clone(),
            planning_area: restaurant.planning_area.clone(),
            cluster_density: restaurant.cluster_density,
            dist_to_facility: restaurant.dist_to_facility,
            is_chain: restaurant.is_chain,
            is_facility_adjacent: restaurant.is_facility_adjacent,
            predicted_rating: scored.predicted_rating,
            residual: scored.residual,
            value_tier: scored.value_tier,
            tier_label: scored.value_tier.label().to_owned(),
            color: scored.value_tier.rgba(),
            hex_color: scored.value_tier.hex().to_owned(),
            badge: scored.badge(),
            explanation: scored.explanation(),
            model_version: model.version.clone(),
            model_fitted_at: model.fitted_at_unix,
        }
    }
}

/// Flatten and rank scored restaurants, largest residual first.
///
/// Ties keep name order so output is stable across runs.
#[must_use]
pub fn ranked_records(scored: &[ScoredRestaurant], model: &ModelInfo) -> Vec<ScoredRecord> {
    let mut records: Vec<ScoredRecord> = scored
        .iter()
        .map(|s| ScoredRecord::from_scored(s, model))
        .collect();
    records.sort_by(|a, b| {
        b.residual
            .total_cmp(&a.residual)
            .then_with(|| a.name.cmp(&b.name))
    });
    records
}

/// Write `records` as a JSON array, replacing `path` atomically.
///
/// # Errors
/// Returns [`DataError::Encode`] when serialisation fails and
/// [`DataError::Write`] when the file cannot be written. On error any
/// existing file at `path` is left untouched.
pub fn write_scored(path: &Utf8Path, records: &[ScoredRecord]) -> Result<(), DataError> {
    stage_scored(path, records)?.commit()
}

/// Encode `records` into a temporary file next to `path`, leaving any
/// existing dataset in place until [`StagedDataset::commit`].
///
/// # Errors
/// Returns [`DataError::Encode`] when serialisation fails and
/// [`DataError::Write`] when the temporary file cannot be written.
pub fn stage_scored(path: &Utf8Path, records: &[ScoredRecord]) -> Result<StagedDataset, DataError> {
    let bytes = serde_json::to_vec_pretty(records).map_err(|source| DataError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    let file = stage_atomic(path, &bytes).map_err(|source| DataError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(StagedDataset {
        path: path.to_path_buf(),
        records: records.len(),
        file,
    })
}

/// A scored dataset on disk that has not yet replaced its target.
#[derive(Debug)]
#[must_use = "a staged dataset is discarded unless committed"]
pub struct StagedDataset {
    path: Utf8PathBuf,
    records: usize,
    file: StagedFile,
}

impl StagedDataset {
    /// Replace the dataset at the staged path.
    ///
    /// # Errors
    /// Returns [`DataError::Write`] when the rename fails.
    pub fn commit(self) -> Result<(), DataError> {
        let Self {
            path,
            records,
            file,
        } = self;
        file.commit().map_err(|source| DataError::Write {
            path: path.clone(),
            source,
        })?;
        info!("wrote {records} scored restaurants to {path}");
        Ok(())
    }
}

/// Read a scored dataset written by [`write_scored`].
///
/// # Errors
/// Returns [`DataError::Read`] or [`DataError::Parse`].
pub fn read_scored(path: &Utf8Path) -> Result<Vec<ScoredRecord>, DataError> {
    let bytes = read_bytes(path).map_err(|source| DataError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| DataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Count of records per value tier, in tier order.
#[must_use]
pub fn tier_counts(records: &[ScoredRecord]) -> [(ValueTier, usize); 4] {
    [
        ValueTier::Gem,
        ValueTier::FairAbove,
        ValueTier::FairBelow,
        ValueTier::Overvalued,
    ]
    .map(|tier| {
        let count = records.iter().filter(|r| r.value_tier == tier).count();
        (tier, count)
    })
}

