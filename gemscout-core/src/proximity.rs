//! Distance-based features computed on projected coordinates.
//!
//! Both features need one spatial query per restaurant against indexes that
//! never change during the query phase, so the queries run on the `rayon`
//! pool with shared read-only trees.

use geo::Coord;
use log::warn;
use rayon::prelude::*;
use rstar::RTree;

use crate::config::ProximityConfig;
use crate::projection::LocalProjection;
use crate::reference::FacilityOfInterest;

/// Facility-distance features for one restaurant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacilityProximity {
    /// Planar distance in metres to the nearest facility centroid.
    pub dist_to_facility: f64,
    /// Within the adjacency threshold of a facility.
    pub is_facility_adjacent: bool,
}

/// Read-only index of projected facility centroids.
#[derive(Debug, Clone)]
pub struct FacilityIndex {
    tree: RTree<[f64; 2]>,
    projection: LocalProjection,
}

impl FacilityIndex {
    /// Index the facilities' centroids in projected metres.
    #[must_use]
    pub fn new(facilities: &[FacilityOfInterest], projection: LocalProjection) -> Self {
        let points = facilities
            .iter()
            .map(|facility| projection.project(facility.location))
            .map(|at| [at.x, at.y])
            .collect();
        Self {
            tree: RTree::bulk_load(points),
            projection,
        }
    }

    /// Number of indexed facilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Distance in metres from `location` to the nearest facility.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "planar distance")]
    pub fn nearest_distance(&self, location: Coord<f64>) -> Option<f64> {
        let at = self.projection.project(location);
        self.tree
            .nearest_neighbor(&[at.x, at.y])
            .map(|nearest| (nearest[0] - at.x).hypot(nearest[1] - at.y))
    }
}

/// Compute facility distance and adjacency for every location.
///
/// An empty index degrades every row to the configured missing distance and
/// `is_facility_adjacent = false`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use gemscout_core::{FacilityIndex, FacilityOfInterest, LocalProjection, ProximityConfig, facility_proximity};
///
/// let projection = LocalProjection::centred_on(Coord { x: 103.85, y: 1.30 });
/// let hawker = FacilityOfInterest::new("Maxwell", Coord { x: 103.8447, y: 1.2803 });
/// let index = FacilityIndex::new(&[hawker], projection);
/// let rows = facility_proximity(
///     &[Coord { x: 103.8448, y: 1.2803 }],
///     &index,
///     &ProximityConfig::default(),
/// );
/// assert!(rows[0].is_facility_adjacent);
/// ```
#[must_use]
pub fn facility_proximity(
    locations: &[Coord<f64>],
    index: &FacilityIndex,
    config: &ProximityConfig,
) -> Vec<FacilityProximity> {
    if index.is_empty() {
        warn!(
            "no facilities loaded; using {} m for {} restaurants",
            config.missing_facility_distance_m,
            locations.len()
        );
        return vec![
            FacilityProximity {
                dist_to_facility: config.missing_facility_distance_m,
                is_facility_adjacent: false,
            };
            locations.len()
        ];
    }
    locations
        .par_iter()
        .map(|&location| {
            let dist_to_facility = index
                .nearest_distance(location)
                .unwrap_or(config.missing_facility_distance_m);
            FacilityProximity {
                dist_to_facility,
                is_facility_adjacent: dist_to_facility < config.adjacency_threshold_m,
            }
        })
        .collect()
}

/// Count, for every location, the other locations within `radius_m` metres.
///
/// The radius is inclusive and each location excludes only itself, so two
/// restaurants sharing a coordinate count each other.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use gemscout_core::{LocalProjection, cluster_densities};
///
/// let projection = LocalProjection::centred_on(Coord { x: 103.85, y: 1.30 });
/// let here = Coord { x: 103.85, y: 1.30 };
/// let far = Coord { x: 103.86, y: 1.30 };
/// assert_eq!(cluster_densities(&[here, here, far], &projection, 200.0), vec![1, 1, 0]);
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "squared search radius")]
pub fn cluster_densities(
    locations: &[Coord<f64>],
    projection: &LocalProjection,
    radius_m: f64,
) -> Vec<u32> {
    let projected: Vec<[f64; 2]> = locations
        .iter()
        .map(|&location| projection.project(location))
        .map(|at| [at.x, at.y])
        .collect();
    let tree = RTree::bulk_load(projected.clone());
    let radius_sq = radius_m * radius_m;
    projected
        .par_iter()
        .map(|&at| {
            let within = tree.locate_within_distance(at, radius_sq).count();
            u32::try_from(within.saturating_sub(1)).unwrap_or(u32::MAX)
        })
        .collect()
}
