//! Loading the inputs shared by `score` and `rescore`.

use camino::{Utf8Path, Utf8PathBuf};
use gemscout_core::{FeaturePipeline, PipelineConfig, PipelineReport, Restaurant};
use gemscout_data::{read_facilities, read_listings, read_zones};
use gemscout_fs::{is_file, read_bytes};
use log::{info, warn};

use crate::{ARG_LISTINGS, CliError};

/// Listings dump plus the optional reference layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourcePaths {
    /// JSON array of scraped listings.
    pub(crate) listings: Utf8PathBuf,
    /// Administrative zone boundaries (GeoJSON).
    pub(crate) zones: Option<Utf8PathBuf>,
    /// Facilities of interest (GeoJSON).
    pub(crate) facilities: Option<Utf8PathBuf>,
}

impl SourcePaths {
    /// The listings dump is mandatory; reference layers degrade when absent.
    pub(crate) fn validate(&self) -> Result<(), CliError> {
        require_existing(&self.listings, ARG_LISTINGS)
    }
}

pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read a JSON pipeline configuration, or the defaults when none is given.
pub(crate) fn load_pipeline_config(path: Option<&Utf8Path>) -> Result<PipelineConfig, CliError> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let bytes = read_bytes(path).map_err(|source| CliError::ReadPipelineConfig {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| CliError::ParsePipelineConfig {
        path: path.to_path_buf(),
        source,
    })
}

/// Read every input and run the feature pipeline over the listings.
pub(crate) fn build_features(
    config: PipelineConfig,
    sources: &SourcePaths,
) -> Result<(Vec<Restaurant>, PipelineReport), CliError> {
    let listings = read_listings(&sources.listings)?;
    let zones = match &sources.zones {
        Some(path) => read_zones(path)?,
        None => {
            warn!("no zone boundaries configured; every restaurant is in an unknown area");
            Vec::new()
        }
    };
    let facilities = match &sources.facilities {
        Some(path) => read_facilities(path)?,
        None => {
            warn!("no facilities configured; facility distance is constant");
            Vec::new()
        }
    };
    let pipeline = FeaturePipeline::new(config, &zones, &facilities)?;
    let (restaurants, report) = pipeline.build(listings);
    info!(
        "read {} listings from {}: {} dropped, {} duplicates collapsed",
        report.normalize.input,
        sources.listings,
        report.normalize.dropped(),
        report.duplicates_collapsed
    );
    Ok((restaurants, report))
}
