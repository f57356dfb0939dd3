//! Test helpers that lay out listings and reference files in a temp dir.

use camino::{Utf8Path, Utf8PathBuf};
use gemscout_core::RawListing;
use std::fs;
use tempfile::TempDir;

use crate::inputs::SourcePaths;
use crate::rescore::RescoreConfig;
use crate::score::ScoreConfig;

pub(super) const STANDOUT: &str = "Standout Laksa";
pub(super) const ZONE_NAME: &str = "Outram";

const CENTRE_LAT: f64 = 1.30;
const CENTRE_LON: f64 = 103.85;

/// Temporary workspace holding inputs and outputs of one CLI run.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root =
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn write_listings(&self, name: &str, listings: &[RawListing]) -> Utf8PathBuf {
        let path = self.path(name);
        let bytes = serde_json::to_vec(listings).expect("encode listings");
        write_utf8(&path, &bytes);
        path
    }

    /// A square zone around the listing centre.
    pub(super) fn write_zones(&self) -> Utf8PathBuf {
        let path = self.path("zones.geojson");
        let json = format!(
            r#"{{"type": "FeatureCollection", "features": [
                {{"type": "Feature", "properties": {{"PLN_AREA_N": "{ZONE_NAME}"}},
                  "geometry": {{"type": "Polygon", "coordinates": [[[103.84,1.29],[103.86,1.29],[103.86,1.31],[103.84,1.31],[103.84,1.29]]]}}}}
            ]}}"#
        );
        write_utf8(&path, json.as_bytes());
        path
    }

    /// A hawker centre sitting on the listing centre.
    pub(super) fn write_facilities(&self) -> Utf8PathBuf {
        let path = self.path("hawkers.geojson");
        let json = format!(
            r#"{{"type": "FeatureCollection", "features": [
                {{"type": "Feature", "properties": {{"name": "Maxwell"}},
                  "geometry": {{"type": "Point", "coordinates": [{CENTRE_LON}, {CENTRE_LAT}]}}}}
            ]}}"#
        );
        write_utf8(&path, json.as_bytes());
        path
    }

    pub(super) fn score_config(&self, listings: Utf8PathBuf) -> ScoreConfig {
        ScoreConfig {
            sources: self.sources(listings),
            output: self.path("scored.json"),
            model: self.path("model.bin"),
            pipeline_config: None,
            cv_folds: 5,
            top_k: None,
            chain_threshold: None,
        }
    }

    pub(super) fn rescore_config(&self, listings: Utf8PathBuf) -> RescoreConfig {
        RescoreConfig {
            sources: self.sources(listings),
            output: self.path("rescored.json"),
            model: self.path("model.bin"),
            pipeline_config: None,
        }
    }

    fn sources(&self, listings: Utf8PathBuf) -> SourcePaths {
        SourcePaths {
            listings,
            zones: Some(self.path("zones.geojson")),
            facilities: Some(self.path("hawkers.geojson")),
        }
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write fixture file");
}

/// 99 peers rated 3.5 and one standout rated `standout_rating`, all at the
/// same spot, plus one listing without coordinates and one lower-reviewed
/// duplicate of the first peer.
pub(super) fn standout_listings(standout_rating: f64) -> Vec<RawListing> {
    let mut listings: Vec<RawListing> = (0..99)
        .map(|i| {
            RawListing::new(format!("Peer {i}"), CENTRE_LAT, CENTRE_LON, 3.5)
                .with_review_count(200)
                .with_category("Hawker")
        })
        .collect();
    listings.push(
        RawListing::new(STANDOUT, CENTRE_LAT, CENTRE_LON, standout_rating)
            .with_review_count(200)
            .with_category("Hawker"),
    );
    listings.push(
        RawListing::new("Peer 0", CENTRE_LAT, CENTRE_LON, 3.5)
            .with_review_count(10)
            .with_category("Hawker"),
    );
    listings.push(RawListing {
        name: Some("Nowhere Cafe".to_owned()),
        rating: Some(4.0),
        ..RawListing::default()
    });
    listings
}
