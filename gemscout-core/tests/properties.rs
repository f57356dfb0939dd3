//! Property tests for the spatial features and the residual ranker.
#![expect(
    clippy::float_arithmetic,
    clippy::indexing_slicing,
    reason = "properties offset coordinates and compare per-index densities"
)]

use gemscout_core::test_support::square_zone;
use gemscout_core::{
    BoundingBox, FeaturePipeline, LocalProjection, PipelineConfig, RawListing, ValueTier,
    cluster_densities,
};
use geo::Coord;
use proptest::prelude::*;

fn projection() -> LocalProjection {
    LocalProjection::centred_on(BoundingBox::default().centre())
}

fn planar_distance(projection: &LocalProjection, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let (pa, pb) = (projection.project(a), projection.project(b));
    (pa.x - pb.x).hypot(pa.y - pb.y)
}

fn city_point() -> impl Strategy<Value = Coord<f64>> {
    (103.84..103.86_f64, 1.29..1.31_f64).prop_map(|(x, y)| Coord { x, y })
}

proptest! {
    #[test]
    fn adding_a_close_neighbour_increments_density_by_one(
        points in prop::collection::vec(city_point(), 1..40),
        bearing in 0.0..std::f64::consts::TAU,
        metres in 1.0..190.0_f64,
    ) {
        let projection = projection();
        let anchor = points[0];
        let one_lat = planar_distance(&projection, anchor, Coord { x: anchor.x, y: anchor.y + 1.0 });
        let one_lon = planar_distance(&projection, anchor, Coord { x: anchor.x + 1.0, y: anchor.y });
        let newcomer = Coord {
            x: anchor.x + metres * bearing.cos() / one_lon,
            y: anchor.y + metres * bearing.sin() / one_lat,
        };

        let before = cluster_densities(&points, &projection, 200.0);
        let mut extended = points.clone();
        extended.push(newcomer);
        let after = cluster_densities(&extended, &projection, 200.0);

        prop_assert_eq!(after[0], before[0] + 1);
        for (index, point) in points.iter().enumerate() {
            let distance = planar_distance(&projection, *point, newcomer);
            if distance > 200.5 {
                prop_assert_eq!(after[index], before[index]);
            }
        }
    }

    #[test]
    fn tiering_is_idempotent(residual in -4.0..4.0_f64) {
        let first = ValueTier::from_residual(residual);
        prop_assert_eq!(first, ValueTier::from_residual(residual));
        let expected = if residual >= 0.5 {
            ValueTier::Gem
        } else if residual > 0.0 {
            ValueTier::FairAbove
        } else if residual > -0.5 {
            ValueTier::FairBelow
        } else {
            ValueTier::Overvalued
        };
        prop_assert_eq!(first, expected);
    }

    #[test]
    fn every_built_restaurant_is_in_bounds_and_labelled(
        raw in prop::collection::vec((1.0..1.6_f64, 103.4..104.2_f64, 1.0..5.0_f64), 0..30),
    ) {
        let zones = [
            square_zone("Central", 103.80, 1.27, 0.08),
            square_zone("North", 103.74, 1.38, 0.10),
        ];
        let pipeline = FeaturePipeline::new(PipelineConfig::default(), &zones, &[])
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let listings = raw
            .iter()
            .enumerate()
            .map(|(i, &(lat, lon, rating))| RawListing::new(format!("r{i}"), lat, lon, rating))
            .collect();
        let (restaurants, _) = pipeline.build(listings);
        let bounds = BoundingBox::default();
        for restaurant in &restaurants {
            prop_assert!(bounds.contains(restaurant.location));
            prop_assert!(!restaurant.planning_area.is_empty());
            prop_assert!(restaurant.log_reviews >= 0.0);
            prop_assert!(restaurant.dist_to_facility >= 0.0);
            if restaurant.location.y > 1.47 {
                prop_assert_eq!(restaurant.planning_area.as_str(), "Outside region");
            }
        }
    }
}
