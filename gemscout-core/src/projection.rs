//! Local metric projection for distance-based features.
//!
//! Distances on raw longitude/latitude are distorted, so every spatial join
//! and radius query runs on planar metres. For a metro-sized region an
//! equirectangular projection about the region centre, scaled by the WGS84
//! radii of curvature at the origin latitude, keeps distance error well
//! under a metre at the 200 m scales the features use.

use geo::Coord;

const WGS84_SEMI_MAJOR_M: f64 = 6_378_137.0;
const WGS84_ECCENTRICITY_SQ: f64 = 0.006_694_379_990_14;

/// Projects WGS84 coordinates to metres east/north of an origin.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use gemscout_core::LocalProjection;
///
/// let projection = LocalProjection::centred_on(Coord { x: 103.8, y: 1.35 });
/// let origin = projection.project(Coord { x: 103.8, y: 1.35 });
/// assert_eq!(origin, Coord { x: 0.0, y: 0.0 });
///
/// // One thousandth of a degree of latitude is roughly 110 metres.
/// let north = projection.project(Coord { x: 103.8, y: 1.351 });
/// assert!((north.y - 110.6).abs() < 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin: Coord<f64>,
    metres_per_degree_lon: f64,
    metres_per_degree_lat: f64,
}

impl LocalProjection {
    /// Build a projection whose origin is `origin` (`x = lon`, `y = lat`).
    pub fn centred_on(origin: Coord<f64>) -> Self {
        let phi = origin.y.to_radians();
        let sin_sq = phi.sin().powi(2);
        let denom = 1.0 - WGS84_ECCENTRICITY_SQ * sin_sq;
        let meridional = WGS84_SEMI_MAJOR_M * (1.0 - WGS84_ECCENTRICITY_SQ) / denom.powf(1.5);
        let prime_vertical = WGS84_SEMI_MAJOR_M / denom.sqrt();
        let per_radian_to_degree = std::f64::consts::PI / 180.0;
        Self {
            origin,
            metres_per_degree_lon: prime_vertical * phi.cos() * per_radian_to_degree,
            metres_per_degree_lat: meridional * per_radian_to_degree,
        }
    }

    /// Project a WGS84 coordinate into metres.
    pub fn project(&self, location: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (location.x - self.origin.x) * self.metres_per_degree_lon,
            y: (location.y - self.origin.y) * self.metres_per_degree_lat,
        }
    }
}
