//! Builders shared by unit and behaviour tests.

use geo::{Coord, polygon};

use crate::config::OTHER_CATEGORY;
use crate::reference::AdministrativeZone;
use crate::restaurant::Restaurant;

/// A restaurant with neutral features at `location`.
///
/// Tests override the fields they care about.
#[must_use]
pub fn restaurant_at(name: &str, location: Coord<f64>) -> Restaurant {
    Restaurant {
        name: name.to_owned(),
        location,
        rating: 4.0,
        review_count: 150,
        price_level: None,
        category: OTHER_CATEGORY.to_owned(),
        url: None,
        planning_area: "Central".to_owned(),
        cluster_density: 10,
        dist_to_facility: 500.0,
        is_chain: false,
        is_facility_adjacent: false,
        log_reviews: Restaurant::log_reviews_for(150),
        category_encoded: OTHER_CATEGORY.to_owned(),
        price_level_num: 1,
    }
}

/// An axis-aligned square zone with its south-west corner at
/// (`min_lon`, `min_lat`).
#[must_use]
#[expect(clippy::float_arithmetic, reason = "corner offsets")]
pub fn square_zone(name: &str, min_lon: f64, min_lat: f64, size: f64) -> AdministrativeZone {
    AdministrativeZone::from_polygon(
        name,
        polygon![
            (x: min_lon, y: min_lat),
            (x: min_lon + size, y: min_lat),
            (x: min_lon + size, y: min_lat + size),
            (x: min_lon, y: min_lat + size),
        ],
    )
}
