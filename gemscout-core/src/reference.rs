//! Static reference data: administrative zones and facilities of interest.
//!
//! Both are read-only while scoring. Coordinates are WGS84 with
//! `x = longitude` and `y = latitude`.

use geo::{Centroid, Coord, Geometry, MultiPolygon, Polygon};

/// A named polygonal subdivision of the target region.
///
/// # Examples
/// ```
/// use geo::{polygon, MultiPolygon};
/// use gemscout_core::AdministrativeZone;
///
/// let square = polygon![
///     (x: 103.80, y: 1.30),
///     (x: 103.81, y: 1.30),
///     (x: 103.81, y: 1.31),
///     (x: 103.80, y: 1.31),
/// ];
/// let zone = AdministrativeZone::new("Queenstown", MultiPolygon::new(vec![square]));
/// assert_eq!(zone.name, "Queenstown");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AdministrativeZone {
    /// Display name.
    pub name: String,
    /// Boundary in WGS84 degrees.
    pub boundary: MultiPolygon<f64>,
}

impl AdministrativeZone {
    /// Construct a zone from a name and boundary.
    #[must_use]
    pub fn new(name: impl Into<String>, boundary: MultiPolygon<f64>) -> Self {
        Self {
            name: name.into(),
            boundary,
        }
    }

    /// Construct a zone bounded by a single polygon.
    #[must_use]
    pub fn from_polygon(name: impl Into<String>, polygon: Polygon<f64>) -> Self {
        Self::new(name, MultiPolygon::new(vec![polygon]))
    }
}

/// A reference feature, such as a hawker centre, used for proximity.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityOfInterest {
    /// Display name.
    pub name: String,
    /// Centroid of the facility footprint.
    pub location: Coord<f64>,
}

impl FacilityOfInterest {
    /// Construct a facility at a point.
    #[must_use]
    pub fn new(name: impl Into<String>, location: Coord<f64>) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }

    /// Construct a facility from any geometry, reduced to its centroid.
    ///
    /// Returns `None` for empty geometries, which have no centroid.
    ///
    /// # Examples
    /// ```
    /// use geo::{polygon, Coord, Geometry};
    /// use gemscout_core::FacilityOfInterest;
    ///
    /// let footprint = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)];
    /// let facility = FacilityOfInterest::from_geometry("Maxwell", &Geometry::Polygon(footprint))
    ///     .expect("non-empty footprint");
    /// assert_eq!(facility.location, Coord { x: 1.0, y: 1.0 });
    /// ```
    #[must_use]
    pub fn from_geometry(name: impl Into<String>, geometry: &Geometry<f64>) -> Option<Self> {
        geometry
            .centroid()
            .map(|centroid| Self::new(name, centroid.0))
    }
}
