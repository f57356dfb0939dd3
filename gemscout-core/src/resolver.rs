//! Tiered assignment of restaurants to administrative zones.
//!
//! Resolution runs as a chain of passes over the set of still-unresolved
//! restaurants. Each pass is a pure lookup against the read-only
//! [`ZoneIndex`] and only fills gaps left by the passes before it:
//!
//! 1. strict containment in a zone polygon;
//! 2. interior points: nearest zone within the generous threshold;
//! 3. border-band points: nearest zone within the tight threshold;
//! 4. whatever remains gets the outside sentinel.
//!
//! A final safety net forces everything north of the hard cutoff latitude to
//! the sentinel, whatever the earlier passes decided.

use geo::{BoundingRect, Contains, Coord, MultiPolygon, Point, Polygon};
use log::{info, warn};
use rayon::prelude::*;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::config::{ResolverConfig, UNKNOWN_AREA_LABEL};
use crate::projection::LocalProjection;
use crate::reference::AdministrativeZone;

/// Bounding box of one zone, used to prefilter containment tests.
#[derive(Debug, Clone)]
struct ZoneEnvelope {
    zone: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for ZoneEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// One projected boundary edge of a zone.
#[derive(Debug, Clone)]
struct ZoneSegment {
    zone: usize,
    start: [f64; 2],
    end: [f64; 2],
}

impl RTreeObject for ZoneSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.start, self.end)
    }
}

impl PointDistance for ZoneSegment {
    #[expect(clippy::float_arithmetic, reason = "point to segment distance")]
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let [sx, sy] = self.start;
        let (dx, dy) = (self.end[0] - sx, self.end[1] - sy);
        let length_sq = dx * dx + dy * dy;
        let t = if length_sq > 0.0 {
            (((point[0] - sx) * dx + (point[1] - sy) * dy) / length_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (px, py) = (sx + t * dx - point[0], sy + t * dy - point[1]);
        px * px + py * py
    }
}

/// Read-only spatial index over zone boundaries.
///
/// Containment is tested on the WGS84 polygons; nearest-zone distances are
/// measured in projected metres to the closest boundary edge.
#[derive(Debug, Clone)]
pub struct ZoneIndex {
    names: Vec<String>,
    boundaries: Vec<MultiPolygon<f64>>,
    envelopes: RTree<ZoneEnvelope>,
    segments: RTree<ZoneSegment>,
    projection: LocalProjection,
}

impl ZoneIndex {
    /// Index `zones`, keeping their order for tie-breaks.
    #[must_use]
    pub fn new(zones: &[AdministrativeZone], projection: LocalProjection) -> Self {
        let mut envelopes = Vec::with_capacity(zones.len());
        let mut segments = Vec::new();
        for (zone, entry) in zones.iter().enumerate() {
            if let Some(rect) = entry.boundary.bounding_rect() {
                envelopes.push(ZoneEnvelope {
                    zone,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                });
            }
            for polygon in &entry.boundary {
                push_segments(polygon, zone, &projection, &mut segments);
            }
        }
        Self {
            names: zones.iter().map(|zone| zone.name.clone()).collect(),
            boundaries: zones.iter().map(|zone| zone.boundary.clone()).collect(),
            envelopes: RTree::bulk_load(envelopes),
            segments: RTree::bulk_load(segments),
            projection,
        }
    }

    /// Number of indexed zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the index holds no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of the zone at `zone`, in reference order.
    #[must_use]
    pub fn name(&self, zone: usize) -> Option<&str> {
        self.names.get(zone).map(String::as_str)
    }

    /// Lowest-indexed zone whose interior strictly contains `location`.
    #[must_use]
    pub fn containing_zone(&self, location: Coord<f64>) -> Option<usize> {
        let point = Point(location);
        self.envelopes
            .locate_in_envelope_intersecting(&AABB::from_point([location.x, location.y]))
            .map(|candidate| candidate.zone)
            .filter(|&zone| {
                self.boundaries
                    .get(zone)
                    .is_some_and(|boundary| boundary.contains(&point))
            })
            .min()
    }

    /// Nearest zone and its boundary distance in metres.
    ///
    /// Equidistant zones resolve to the lowest index.
    #[must_use]
    pub fn nearest_zone(&self, location: Coord<f64>) -> Option<(usize, f64)> {
        let projected = self.projection.project(location);
        let query = [projected.x, projected.y];
        let closest = self.segments.nearest_neighbor(&query)?;
        let best_sq = closest.distance_2(&query);
        let zone = self
            .segments
            .locate_within_distance(query, best_sq)
            .filter(|segment| segment.distance_2(&query) <= best_sq)
            .map(|segment| segment.zone)
            .min()
            .unwrap_or(closest.zone);
        Some((zone, best_sq.sqrt()))
    }
}

fn push_segments(
    polygon: &Polygon<f64>,
    zone: usize,
    projection: &LocalProjection,
    out: &mut Vec<ZoneSegment>,
) {
    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
        for line in ring.lines() {
            let start = projection.project(line.start);
            let end = projection.project(line.end);
            out.push(ZoneSegment {
                zone,
                start: [start.x, start.y],
                end: [end.x, end.y],
            });
        }
    }
}

/// Which pass assigned a restaurant's zone label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionTier {
    /// Strictly inside a zone polygon.
    Contained,
    /// Interior point matched to the nearest zone within the generous threshold.
    InteriorNearest,
    /// Border-band point matched to the nearest zone within the tight threshold.
    BorderNearest,
    /// No pass matched; labelled with the sentinel.
    Unresolved,
    /// Forced to the sentinel by the hard latitude cutoff.
    SafetyNet,
    /// No zone reference was loaded.
    NoReference,
}

/// Zone label for one restaurant and the pass that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneAssignment {
    /// Zone name, or a sentinel label.
    pub planning_area: String,
    /// Pass that produced the label.
    pub tier: ResolutionTier,
}

/// Per-tier counts of a resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveReport {
    /// Matched by [`ResolutionTier::Contained`].
    pub contained: usize,
    /// Matched by [`ResolutionTier::InteriorNearest`].
    pub interior_nearest: usize,
    /// Matched by [`ResolutionTier::BorderNearest`].
    pub border_nearest: usize,
    /// Left [`ResolutionTier::Unresolved`].
    pub unresolved: usize,
    /// Restaurants forced to the sentinel by the cutoff, including those an
    /// earlier pass had matched.
    pub safety_net: usize,
    /// Labelled without any zone reference.
    pub no_reference: usize,
}

impl ResolveReport {
    fn record(&mut self, tier: ResolutionTier) {
        match tier {
            ResolutionTier::Contained => self.contained += 1,
            ResolutionTier::InteriorNearest => self.interior_nearest += 1,
            ResolutionTier::BorderNearest => self.border_nearest += 1,
            ResolutionTier::Unresolved => self.unresolved += 1,
            ResolutionTier::SafetyNet => self.safety_net += 1,
            ResolutionTier::NoReference => self.no_reference += 1,
        }
    }
}

type Matches = Vec<(usize, usize)>;

/// Run one resolution pass over `pending`, returning matched
/// `(restaurant, zone)` pairs and the restaurants still unresolved.
fn resolve_pass<F>(pending: Vec<usize>, attempt: F) -> (Matches, Vec<usize>)
where
    F: Fn(usize) -> Option<usize> + Sync,
{
    let outcomes: Vec<(usize, Option<usize>)> = pending
        .into_par_iter()
        .map(|restaurant| (restaurant, attempt(restaurant)))
        .collect();
    let mut matched = Vec::new();
    let mut remaining = Vec::new();
    for (restaurant, zone) in outcomes {
        match zone {
            Some(zone) => matched.push((restaurant, zone)),
            None => remaining.push(restaurant),
        }
    }
    (matched, remaining)
}

/// Assign every location a zone label.
///
/// The result has one entry per input location, in order. With an empty
/// index every location is labelled [`UNKNOWN_AREA_LABEL`].
///
/// # Examples
/// ```
/// use geo::{polygon, Coord};
/// use gemscout_core::{
///     AdministrativeZone, LocalProjection, ResolutionTier, ResolverConfig, ZoneIndex,
///     resolve_areas,
/// };
///
/// let zone = AdministrativeZone::from_polygon(
///     "Bukit Merah",
///     polygon![(x: 103.80, y: 1.27), (x: 103.83, y: 1.27), (x: 103.83, y: 1.30), (x: 103.80, y: 1.30)],
/// );
/// let index = ZoneIndex::new(&[zone], LocalProjection::centred_on(Coord { x: 103.8, y: 1.3 }));
/// let (assignments, report) = resolve_areas(
///     &[Coord { x: 103.81, y: 1.28 }, Coord { x: 103.90, y: 1.40 }],
///     &index,
///     &ResolverConfig::default(),
/// );
/// assert_eq!(assignments[0].planning_area, "Bukit Merah");
/// assert_eq!(assignments[1].tier, ResolutionTier::Unresolved);
/// assert_eq!(report.contained, 1);
/// ```
#[must_use]
pub fn resolve_areas(
    locations: &[Coord<f64>],
    index: &ZoneIndex,
    config: &ResolverConfig,
) -> (Vec<ZoneAssignment>, ResolveReport) {
    let mut report = ResolveReport::default();
    if index.is_empty() {
        warn!(
            "no administrative zones loaded; labelling {} restaurants as {UNKNOWN_AREA_LABEL:?}",
            locations.len()
        );
        let assignments = locations
            .iter()
            .map(|_| {
                report.record(ResolutionTier::NoReference);
                ZoneAssignment {
                    planning_area: UNKNOWN_AREA_LABEL.to_owned(),
                    tier: ResolutionTier::NoReference,
                }
            })
            .collect();
        return (assignments, report);
    }

    let location = |restaurant: usize| locations.get(restaurant).copied();
    let within = |restaurant: usize, threshold: f64| {
        location(restaurant)
            .and_then(|at| index.nearest_zone(at))
            .filter(|&(_, distance)| distance <= threshold)
            .map(|(zone, _)| zone)
    };

    let pending: Vec<usize> = (0..locations.len()).collect();
    let (contained, pending) = resolve_pass(pending, |restaurant| {
        location(restaurant).and_then(|at| index.containing_zone(at))
    });
    let (border, interior): (Vec<usize>, Vec<usize>) = pending.into_iter().partition(|&r| {
        location(r).is_some_and(|at| at.y > config.border_split_lat)
    });
    let (interior_matches, interior_left) = resolve_pass(interior, |restaurant| {
        within(restaurant, config.interior_threshold_m)
    });
    let (border_matches, border_left) = resolve_pass(border, |restaurant| {
        within(restaurant, config.border_threshold_m)
    });

    let mut resolved: Vec<Option<(usize, ResolutionTier)>> = vec![None; locations.len()];
    let passes = [
        (contained, ResolutionTier::Contained),
        (interior_matches, ResolutionTier::InteriorNearest),
        (border_matches, ResolutionTier::BorderNearest),
    ];
    for (matches, tier) in passes {
        for (restaurant, zone) in matches {
            if let Some(slot) = resolved.get_mut(restaurant) {
                *slot = Some((zone, tier));
            }
        }
    }
    let unresolved = interior_left.len() + border_left.len();

    let assignments: Vec<ZoneAssignment> = locations
        .iter()
        .zip(resolved)
        .map(|(at, outcome)| {
            let (planning_area, tier) = match outcome {
                _ if at.y > config.hard_cutoff_lat => {
                    (config.outside_label.clone(), ResolutionTier::SafetyNet)
                }
                Some((zone, tier)) => match index.name(zone) {
                    Some(name) => (name.to_owned(), tier),
                    None => (config.outside_label.clone(), ResolutionTier::Unresolved),
                },
                None => (config.outside_label.clone(), ResolutionTier::Unresolved),
            };
            report.record(tier);
            ZoneAssignment {
                planning_area,
                tier,
            }
        })
        .collect();

    info!(
        "resolved zones: {} contained, {} interior nearest, {} border nearest, {} outside ({} left by fallbacks), {} forced by cutoff",
        report.contained,
        report.interior_nearest,
        report.border_nearest,
        report.unresolved,
        unresolved,
        report.safety_net
    );
    (assignments, report)
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        clippy::float_arithmetic,
        clippy::indexing_slicing,
        reason = "tests fail loudly, build offset squares and index known-length results"
    )]

    use super::*;
    use geo::polygon;
    use rstest::{fixture, rstest};

    fn square(min_lon: f64, min_lat: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: min_lon, y: min_lat),
            (x: min_lon + size, y: min_lat),
            (x: min_lon + size, y: min_lat + size),
            (x: min_lon, y: min_lat + size),
        ]
    }

    #[fixture]
    fn index() -> ZoneIndex {
        let zones = [
            AdministrativeZone::from_polygon("West", square(103.70, 1.30, 0.05)),
            AdministrativeZone::from_polygon("East", square(103.75, 1.30, 0.05)),
            AdministrativeZone::from_polygon("North", square(103.70, 1.40, 0.05)),
        ];
        ZoneIndex::new(&zones, LocalProjection::centred_on(Coord { x: 103.8, y: 1.35 }))
    }

    fn resolve_one(index: &ZoneIndex, at: Coord<f64>) -> ZoneAssignment {
        let (mut assignments, _) = resolve_areas(&[at], index, &ResolverConfig::default());
        assignments.remove(0)
    }

    #[rstest]
    fn contained_points_take_their_zone(index: ZoneIndex) {
        let hit = resolve_one(&index, Coord { x: 103.77, y: 1.32 });
        assert_eq!(hit.planning_area, "East");
        assert_eq!(hit.tier, ResolutionTier::Contained);
    }

    #[rstest]
    fn shared_edge_is_resolved_to_first_zone(index: ZoneIndex) {
        // On the shared edge neither polygon strictly contains the point, so
        // the nearest pass breaks the distance tie by reference order.
        let hit = resolve_one(&index, Coord { x: 103.75, y: 1.32 });
        assert_eq!(hit.planning_area, "West");
        assert_eq!(hit.tier, ResolutionTier::InteriorNearest);
    }

    #[rstest]
    fn interior_gap_uses_generous_threshold(index: ZoneIndex) {
        // ~1.1 km south of the zones.
        let hit = resolve_one(&index, Coord { x: 103.72, y: 1.29 });
        assert_eq!(hit.planning_area, "West");
        assert_eq!(hit.tier, ResolutionTier::InteriorNearest);
    }

    #[rstest]
    fn interior_beyond_threshold_is_outside(index: ZoneIndex) {
        let hit = resolve_one(&index, Coord { x: 103.72, y: 1.27 });
        assert_eq!(hit.planning_area, DEFAULT_OUTSIDE);
        assert_eq!(hit.tier, ResolutionTier::Unresolved);
    }

    #[rstest]
    #[case(0.000_5, "North", ResolutionTier::BorderNearest)]
    #[case(0.002, DEFAULT_OUTSIDE, ResolutionTier::Unresolved)]
    fn border_band_uses_tight_threshold(
        index: ZoneIndex,
        #[case] offset: f64,
        #[case] expected: &str,
        #[case] tier: ResolutionTier,
    ) {
        // East of "North" inside the border band; 0.0005° ≈ 56 m, 0.002° ≈ 222 m.
        let hit = resolve_one(&index, Coord { x: 103.75 + offset, y: 1.445 });
        assert_eq!(hit.planning_area, expected);
        assert_eq!(hit.tier, tier);
    }

    #[rstest]
    fn safety_net_overrides_containment() {
        let zones = [AdministrativeZone::from_polygon(
            "Woodlands",
            square(103.76, 1.43, 0.06),
        )];
        let index = ZoneIndex::new(&zones, LocalProjection::centred_on(Coord { x: 103.8, y: 1.35 }));
        let (assignments, report) = resolve_areas(
            &[Coord { x: 103.78, y: 1.475 }, Coord { x: 103.78, y: 1.45 }],
            &index,
            &ResolverConfig::default(),
        );
        assert_eq!(assignments[0].planning_area, DEFAULT_OUTSIDE);
        assert_eq!(assignments[0].tier, ResolutionTier::SafetyNet);
        assert_eq!(assignments[1].planning_area, "Woodlands");
        assert_eq!(report.safety_net, 1);
        assert_eq!(report.contained, 1);
    }

    #[rstest]
    fn empty_reference_labels_unknown() {
        let index = ZoneIndex::new(&[], LocalProjection::centred_on(Coord { x: 0.0, y: 0.0 }));
        let (assignments, report) =
            resolve_areas(&[Coord { x: 103.8, y: 1.3 }], &index, &ResolverConfig::default());
        assert_eq!(assignments[0].planning_area, UNKNOWN_AREA_LABEL);
        assert_eq!(report.no_reference, 1);
    }

    #[rstest]
    fn multipolygon_holes_are_not_contained() {
        let outer = square(103.70, 1.30, 0.10);
        let hole = square(103.74, 1.34, 0.02);
        let with_hole = Polygon::new(outer.exterior().clone(), vec![hole.exterior().clone()]);
        let zones = [AdministrativeZone::from_polygon("Ring", with_hole)];
        let index = ZoneIndex::new(&zones, LocalProjection::centred_on(Coord { x: 103.8, y: 1.35 }));
        assert_eq!(index.containing_zone(Coord { x: 103.75, y: 1.35 }), None);
        let (zone, distance) = index
            .nearest_zone(Coord { x: 103.75, y: 1.35 })
            .expect("zone indexed");
        assert_eq!(zone, 0);
        assert!((distance - 1_106.0).abs() < 5.0, "distance {distance}");
    }

    const DEFAULT_OUTSIDE: &str = crate::config::DEFAULT_OUTSIDE_LABEL;
}
