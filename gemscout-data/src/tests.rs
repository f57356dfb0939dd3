//! Unit tests for readers, writers and the dataset cache.
#![expect(clippy::expect_used, reason = "tests fail loudly on setup errors")]

use super::*;
use camino::Utf8PathBuf;
use gemscout_core::test_support::restaurant_at;
use gemscout_core::{PriceLevel, ScoredRestaurant, ValueTier};
use gemscout_model::ModelInfo;
use geo::Coord;
use rstest::{fixture, rstest};
use std::time::Duration;
use tempfile::TempDir;

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

#[fixture]
fn model_info() -> ModelInfo {
    ModelInfo {
        version: "0.1.0".to_owned(),
        fitted_at_unix: 1_760_000_000,
        training_rows: 3,
    }
}

fn path_in(dir: &TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf8 temp path")
}

fn scored(name: &str, rating: f64, predicted: f64) -> ScoredRestaurant {
    let mut restaurant = restaurant_at(name, Coord { x: 103.85, y: 1.30 });
    restaurant.rating = rating;
    ScoredRestaurant::new(restaurant, predicted)
}

#[rstest]
fn reads_listings_with_partial_fields(temp_dir: TempDir) {
    let path = path_in(&temp_dir, "listings.json");
    std::fs::write(
        &path,
        r#"[
            {"name": "Tian Tian", "latitude": 1.2805, "longitude": 103.8447, "rating": 4.4,
             "review_count": 5000, "price_level": "$", "category": "Hawker"},
            {"name": "No Coordinates"}
        ]"#,
    )
    .expect("write listings");

    let listings = read_listings(&path).expect("parse listings");
    assert_eq!(listings.len(), 2);
    assert_eq!(listings.first().and_then(|l| l.review_count), Some(5000));
    assert_eq!(listings.get(1).and_then(|l| l.latitude), None);
}

#[rstest]
fn malformed_listings_are_parse_errors(temp_dir: TempDir) {
    let path = path_in(&temp_dir, "listings.json");
    std::fs::write(&path, "{\"not\": \"an array\"}").expect("write listings");
    assert!(matches!(read_listings(&path), Err(DataError::Parse { .. })));
}

#[rstest]
fn missing_reference_files_degrade_to_empty(temp_dir: TempDir) {
    let path = path_in(&temp_dir, "absent.geojson");
    assert!(read_zones(&path).expect("missing zones degrade").is_empty());
    assert!(read_facilities(&path).expect("missing facilities degrade").is_empty());
}

#[rstest]
fn reads_zones_and_facility_centroids(temp_dir: TempDir) {
    let zones_path = path_in(&temp_dir, "zones.geojson");
    std::fs::write(
        &zones_path,
        r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"name": "Outram"},
             "geometry": {"type": "Polygon", "coordinates": [[[103.83,1.27],[103.85,1.27],[103.85,1.29],[103.83,1.29],[103.83,1.27]]]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Point", "coordinates": [103.84, 1.28]}}
        ]}"#,
    )
    .expect("write zones");
    let zones = read_zones(&zones_path).expect("read zones");
    assert_eq!(zones.len(), 1);
    assert_eq!(zones.first().map(|z| z.name.as_str()), Some("Outram"));

    let facilities_path = path_in(&temp_dir, "hawkers.geojson");
    std::fs::write(
        &facilities_path,
        r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]]]}}
        ]}"#,
    )
    .expect("write facilities");
    let facilities = read_facilities(&facilities_path).expect("read facilities");
    let facility = facilities.first().expect("one facility");
    assert_eq!(facility.name, "Facility 0");
    assert_eq!(facility.location, Coord { x: 1.0, y: 1.0 });
}

#[rstest]
fn records_are_ranked_by_residual(model_info: ModelInfo) {
    let rows = [
        scored("Middling", 4.0, 4.1),
        scored("Hidden Gem", 4.8, 4.0),
        scored("Tourist Trap", 3.2, 4.0),
        scored("Also Middling", 4.0, 4.1),
    ];
    let records = ranked_records(&rows, &model_info);
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Hidden Gem", "Also Middling", "Middling", "Tourist Trap"]
    );

    let gem = records.first().expect("gem record");
    assert_eq!(gem.value_tier, ValueTier::Gem);
    assert_eq!(gem.tier_label, ValueTier::Gem.label());
    assert_eq!(gem.color, ValueTier::Gem.rgba());
    assert_eq!(gem.hex_color, ValueTier::Gem.hex());
    assert!(gem.badge.starts_with("Underrated +0.8"));
    assert_eq!(gem.model_version, "0.1.0");
    assert_eq!(gem.model_fitted_at, 1_760_000_000);
    assert_eq!(
        tier_counts(&records),
        [
            (ValueTier::Gem, 1),
            (ValueTier::FairAbove, 0),
            (ValueTier::FairBelow, 2),
            (ValueTier::Overvalued, 1),
        ]
    );
}

#[rstest]
fn price_level_is_written_in_dollar_notation(model_info: ModelInfo) {
    let mut row = scored("Burnt Ends", 4.6, 4.5);
    row.restaurant.price_level = Some(PriceLevel::Luxury);
    let record = ScoredRecord::from_scored(&row, &model_info);
    assert_eq!(record.price_level.as_deref(), Some("$$$$"));
    assert_eq!(record.latitude, 1.30);
    assert_eq!(record.longitude, 103.85);
}

#[rstest]
fn scored_dataset_replaces_atomically(temp_dir: TempDir, model_info: ModelInfo) {
    let path = path_in(&temp_dir, "out/scored.json");
    let first = ranked_records(&[scored("A", 4.0, 4.0)], &model_info);
    write_scored(&path, &first).expect("first write");
    let second = ranked_records(&[scored("B", 4.5, 4.0), scored("C", 3.0, 4.0)], &model_info);
    write_scored(&path, &second).expect("second write");

    let read_back = read_scored(&path).expect("read back");
    let names: Vec<&str> = read_back.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["B", "C"]);
    let tiers: Vec<ValueTier> = read_back.iter().map(|r| r.value_tier).collect();
    assert_eq!(tiers, vec![ValueTier::FairAbove, ValueTier::Overvalued]);
    let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path().join("out"))
        .expect("list output dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[rstest]
fn scored_cache_rereads_after_invalidate(temp_dir: TempDir, model_info: ModelInfo) {
    let path = path_in(&temp_dir, "scored.json");
    write_scored(&path, &ranked_records(&[scored("A", 4.0, 4.0)], &model_info))
        .expect("first write");
    let cache = ScoredDatasetCache::new(path.clone(), Duration::from_secs(300));
    assert_eq!(cache.records().expect("load").len(), 1);

    write_scored(
        &path,
        &ranked_records(&[scored("A", 4.0, 4.0), scored("B", 4.2, 4.0)], &model_info),
    )
    .expect("second write");
    assert_eq!(cache.records().expect("cached").len(), 1);
    cache.invalidate();
    assert_eq!(cache.records().expect("reload").len(), 2);
    assert_eq!(cache.path(), path.as_path());
}
