//! Reading boundary coordinates from GeoJSON or from DMS coordinate lists.

use crate::core::dms;
use crate::domain::model::LonLat;
use crate::utils::error::{CoordBufferError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum InputFormat {
    /// 依副檔名判斷
    #[default]
    Auto,
    #[cfg_attr(feature = "cli", value(name = "geojson"))]
    GeoJson,
    Dms,
}

impl InputFormat {
    pub fn resolve(self, path: &str) -> Self {
        match self {
            Self::Auto => {
                let ext = Path::new(path)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_ascii_lowercase());
                match ext.as_deref() {
                    Some("geojson") | Some("json") => Self::GeoJson,
                    _ => Self::Dms,
                }
            }
            other => other,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Feature {
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: serde_json::Value,
}

pub(crate) fn parse_feature_collection(text: &str) -> Result<FeatureCollection> {
    serde_json::from_str(text)
        .map_err(|e| CoordBufferError::schema(format!("not a GeoJSON feature collection: {}", e)))
}

fn parse_position(value: &serde_json::Value) -> Result<LonLat> {
    let invalid = || CoordBufferError::schema(format!("Invalid coordinate format: {}", value));
    match value.as_array() {
        Some(items) if items.len() == 2 => {
            let lon = items[0].as_f64().ok_or_else(invalid)?;
            let lat = items[1].as_f64().ok_or_else(invalid)?;
            Ok([lon, lat])
        }
        _ => Err(invalid()),
    }
}

/// Rings of a Polygon geometry, each as a list of [lon, lat].
pub(crate) fn polygon_rings(geometry: &Geometry) -> Result<Vec<Vec<LonLat>>> {
    if geometry.kind != "Polygon" {
        return Err(CoordBufferError::schema(format!(
            "Unsupported geometry type: {}",
            geometry.kind
        )));
    }
    let rings = geometry
        .coordinates
        .as_array()
        .ok_or_else(|| CoordBufferError::schema("Polygon coordinates must be an array of rings"))?;

    rings
        .iter()
        .map(|ring| {
            ring.as_array()
                .ok_or_else(|| CoordBufferError::schema(format!("Invalid ring: {}", ring)))?
                .iter()
                .map(parse_position)
                .collect()
        })
        .collect()
}

/// Flattens every ring of every Polygon feature into one [lon, lat] list.
///
/// Fails as a whole on the first offending feature or coordinate.
pub fn read_geojson(text: &str) -> Result<Vec<LonLat>> {
    let collection = parse_feature_collection(text)?;
    if collection.features.is_empty() {
        return Err(CoordBufferError::schema("GeoJSON file has no features"));
    }

    let mut coords = Vec::new();
    for feature in &collection.features {
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or_else(|| CoordBufferError::schema("Unsupported geometry type: null"))?;
        for ring in polygon_rings(geometry)? {
            coords.extend(ring);
        }
    }
    tracing::debug!("Read {} coordinates from GeoJSON", coords.len());
    Ok(coords)
}

/// One `LATDMS [sep] LONDMS` pair per non-empty line, as (lat, lon).
pub fn read_dms_lines(text: &str) -> Result<Vec<(f64, f64)>> {
    let mut pairs = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.len() < 8 || !line.is_char_boundary(7) {
            return Err(CoordBufferError::format(format!(
                "line {}: '{}' is not a coordinate pair",
                index + 1,
                line
            )));
        }

        let (lat_token, lon_token) = line.split_at(7);
        let (lat_hemisphere, lat) = dms::decode_with_hemisphere(lat_token)?;
        let (lon_hemisphere, lon) = dms::decode_with_hemisphere(lon_token.trim())?;

        if !lat_hemisphere.is_latitude() || lon_hemisphere.is_latitude() {
            return Err(CoordBufferError::format(format!(
                "line {}: expected latitude N/S then longitude E/W in '{}'",
                index + 1,
                line
            )));
        }
        if lat.abs() > 90.0 || lon.abs() > 180.0 {
            return Err(CoordBufferError::format(format!(
                "line {}: coordinate out of range in '{}'",
                index + 1,
                line
            )));
        }
        pairs.push((lat, lon));
    }
    tracing::debug!("Read {} DMS coordinate pairs", pairs.len());
    Ok(pairs)
}
