//! Reading reference GeoJSON: planning-area boundaries and facilities.
//!
//! Only the subset of GeoJSON the reference files use is understood:
//! `FeatureCollection`s of `Point`, `Polygon` and `MultiPolygon` features.
//! Features with other geometry types, or without geometry, are skipped
//! with a warning. A missing file degrades to an empty collection so that
//! scoring can continue with constant features.

use camino::Utf8Path;
use gemscout_core::{AdministrativeZone, FacilityOfInterest};
use gemscout_fs::{is_file, read_bytes};
use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use log::{info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::DataError;

/// Property keys consulted, in order, for a feature's display name.
pub const NAME_KEYS: [&str; 4] = ["name", "Name", "NAME", "PLN_AREA_N"];

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

type Position = Vec<f64>;

/// A named geometry read from a feature collection.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedGeometry {
    /// Name from the first of [`NAME_KEYS`] present, if any.
    pub name: Option<String>,
    /// Decoded geometry.
    pub geometry: Geometry<f64>,
}

/// Read every supported feature of a GeoJSON feature collection.
///
/// # Errors
/// Returns [`DataError::Read`] or [`DataError::Parse`] when the file cannot
/// be read or is not a feature collection, and [`DataError::Geometry`] when
/// a supported geometry has malformed coordinates.
pub fn read_features(path: &Utf8Path) -> Result<Vec<NamedGeometry>, DataError> {
    let bytes = read_bytes(path).map_err(|source| DataError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_features(&bytes, path)
}

fn parse_features(bytes: &[u8], path: &Utf8Path) -> Result<Vec<NamedGeometry>, DataError> {
    let collection: FeatureCollection =
        serde_json::from_slice(bytes).map_err(|source| DataError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let mut features = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let Some(raw) = feature.geometry else {
            warn!("feature {index} in {path} has no geometry; skipping");
            continue;
        };
        let kind = raw.kind.clone();
        let decoded = decode_geometry(raw).map_err(|source| DataError::Geometry {
            path: path.to_path_buf(),
            index,
            kind: kind.clone(),
            source,
        })?;
        match decoded {
            Some(geometry) => features.push(NamedGeometry {
                name: feature.properties.as_ref().and_then(feature_name),
                geometry,
            }),
            None => warn!("feature {index} in {path} has unsupported geometry {kind}; skipping"),
        }
    }
    Ok(features)
}

fn feature_name(properties: &Map<String, Value>) -> Option<String> {
    NAME_KEYS
        .iter()
        .filter_map(|key| properties.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_owned)
}

fn decode_geometry(raw: RawGeometry) -> Result<Option<Geometry<f64>>, serde_json::Error> {
    let geometry = match raw.kind.as_str() {
        "Point" => {
            let position: Position = serde_json::from_value(raw.coordinates)?;
            position_coord(&position).map(|coord| Geometry::Point(Point(coord)))
        }
        "Polygon" => {
            let rings: Vec<Vec<Position>> = serde_json::from_value(raw.coordinates)?;
            polygon(rings).map(Geometry::Polygon)
        }
        "MultiPolygon" => {
            let polygons: Vec<Vec<Vec<Position>>> = serde_json::from_value(raw.coordinates)?;
            let parts: Vec<Polygon<f64>> = polygons.into_iter().filter_map(polygon).collect();
            (!parts.is_empty()).then(|| Geometry::MultiPolygon(MultiPolygon::new(parts)))
        }
        _ => None,
    };
    Ok(geometry)
}

fn position_coord(position: &[f64]) -> Option<Coord<f64>> {
    match position {
        [x, y, ..] if x.is_finite() && y.is_finite() => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

fn polygon(rings: Vec<Vec<Position>>) -> Option<Polygon<f64>> {
    let mut lines = rings.into_iter().map(|ring| {
        LineString::new(ring.iter().filter_map(|p| position_coord(p)).collect())
    });
    let exterior = lines.next().filter(|line| line.0.len() >= 3)?;
    Some(Polygon::new(exterior, lines.collect()))
}

/// Read administrative zones from a GeoJSON file.
///
/// Point features are skipped. Unnamed zones are labelled `Zone {index}`.
/// A missing file yields no zones and a warning.
///
/// # Errors
/// Propagates [`read_features`] errors for files that exist.
pub fn read_zones(path: &Utf8Path) -> Result<Vec<AdministrativeZone>, DataError> {
    if !reference_exists(path)? {
        return Ok(Vec::new());
    }
    let zones: Vec<AdministrativeZone> = read_features(path)?
        .into_iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let name = feature.name.unwrap_or_else(|| format!("Zone {index}"));
            match feature.geometry {
                Geometry::Polygon(shape) => Some(AdministrativeZone::from_polygon(name, shape)),
                Geometry::MultiPolygon(shape) => Some(AdministrativeZone::new(name, shape)),
                _ => {
                    warn!("zone {name} in {path} is not a polygon; skipping");
                    None
                }
            }
        })
        .collect();
    info!("read {} zones from {path}", zones.len());
    Ok(zones)
}

/// Read facilities of interest from a GeoJSON file.
///
/// Polygonal footprints are reduced to their centroid. Unnamed facilities
/// are labelled `Facility {index}`. A missing file yields no facilities and
/// a warning.
///
/// # Errors
/// Propagates [`read_features`] errors for files that exist.
pub fn read_facilities(path: &Utf8Path) -> Result<Vec<FacilityOfInterest>, DataError> {
    if !reference_exists(path)? {
        return Ok(Vec::new());
    }
    let facilities: Vec<FacilityOfInterest> = read_features(path)?
        .into_iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let name = feature.name.unwrap_or_else(|| format!("Facility {index}"));
            FacilityOfInterest::from_geometry(name, &feature.geometry)
        })
        .collect();
    info!("read {} facilities from {path}", facilities.len());
    Ok(facilities)
}

fn reference_exists(path: &Utf8Path) -> Result<bool, DataError> {
    let exists = is_file(path).map_err(|source| DataError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if !exists {
        warn!("reference data {path} not found; dependent features will be constant");
    }
    Ok(exists)
}
