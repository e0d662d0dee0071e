use crate::utils::error::{CoordBufferError, Result};
use chrono::NaiveDate;
use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// GeoJSON 軸序：[經度, 緯度]
pub type LonLat = [f64; 2];

/// Coordinate reference systems the pipeline knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    /// EPSG:4326, degrees
    Wgs84,
    /// EPSG:3006, SWEREF 99 TM, metres
    Sweref99Tm,
    /// EPSG:326xx / 327xx, metres
    Utm { zone: u8, north: bool },
}

impl Crs {
    pub fn from_epsg(code: u32) -> Result<Self> {
        match code {
            4326 => Ok(Self::Wgs84),
            3006 => Ok(Self::Sweref99Tm),
            32601..=32660 => Ok(Self::Utm {
                zone: (code - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Ok(Self::Utm {
                zone: (code - 32700) as u8,
                north: false,
            }),
            other => Err(CoordBufferError::projection(format!(
                "unsupported CRS EPSG:{}",
                other
            ))),
        }
    }

    pub fn epsg(&self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::Sweref99Tm => 3006,
            Self::Utm { zone, north: true } => 32600 + *zone as u32,
            Self::Utm { zone, north: false } => 32700 + *zone as u32,
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Self::Wgs84)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// A closed ring in WGS84 degrees (x = longitude, y = latitude).
///
/// Construction closes the ring and rejects rings with fewer than three
/// distinct vertices, so every `GeoRing` describes a polygon boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRing {
    ring: LineString<f64>,
}

impl GeoRing {
    pub fn from_lon_lat(points: &[LonLat]) -> Result<Self> {
        let coords = points.iter().map(|p| Coord { x: p[0], y: p[1] }).collect();
        Self::from_coords(coords)
    }

    pub fn from_lat_lon(pairs: &[(f64, f64)]) -> Result<Self> {
        let coords = pairs.iter().map(|&(lat, lon)| Coord { x: lon, y: lat }).collect();
        Self::from_coords(coords)
    }

    pub(crate) fn from_coords(mut coords: Vec<Coord<f64>>) -> Result<Self> {
        close_ring(&mut coords)?;
        Ok(Self {
            ring: LineString::new(coords),
        })
    }

    pub fn line_string(&self) -> &LineString<f64> {
        &self.ring
    }

    pub fn crs(&self) -> Crs {
        Crs::Wgs84
    }

    /// 依環的順序輸出 (緯度, 經度)
    pub fn lat_lon(&self) -> Vec<(f64, f64)> {
        self.ring.coords().map(|c| (c.y, c.x)).collect()
    }

    pub fn lon_lat(&self) -> Vec<LonLat> {
        self.ring.coords().map(|c| [c.x, c.y]).collect()
    }
}

/// A closed ring in a projected, metre-based CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRing {
    ring: LineString<f64>,
    crs: Crs,
}

impl MetricRing {
    pub(crate) fn new(mut coords: Vec<Coord<f64>>, crs: Crs) -> Result<Self> {
        if crs.is_geographic() {
            return Err(CoordBufferError::projection(format!(
                "{} is not a metric CRS",
                crs
            )));
        }
        close_ring(&mut coords)?;
        Ok(Self {
            ring: LineString::new(coords),
            crs,
        })
    }

    pub fn line_string(&self) -> &LineString<f64> {
        &self.ring
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }
}

fn close_ring(coords: &mut Vec<Coord<f64>>) -> Result<()> {
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }

    let mut distinct: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for c in coords.iter() {
        if !distinct.contains(c) {
            distinct.push(*c);
        }
    }
    if distinct.len() < 3 {
        return Err(CoordBufferError::degenerate(format!(
            "a ring needs at least 3 distinct vertices, got {}",
            distinct.len()
        )));
    }
    Ok(())
}

/// One terminal manoeuvring area as published by the WFS service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmaArea {
    pub name: String,
    pub exterior: Vec<LonLat>,
    pub type_of_area: Option<String>,
    pub position_indicator: Option<String>,
    /// AIRAC effective date
    pub wef: Option<NaiveDate>,
    pub date_time_of_change: Option<String>,
    pub name_of_operator: Option<String>,
    pub origin: Option<String>,
    pub location: Option<String>,
    pub upper_limit: Option<String>,
    pub lower_limit: Option<String>,
    pub comment_1: Option<String>,
    pub comment_2: Option<String>,
    pub quality: Option<String>,
    pub crc_id: Option<String>,
    pub crc_pos: Option<String>,
    pub crc_tot: Option<String>,
    pub msid: Option<i64>,
    pub idnr: Option<i64>,
    pub mi_style: Option<String>,
}

impl TmaArea {
    pub fn named(name: impl Into<String>, exterior: Vec<LonLat>) -> Self {
        Self {
            name: name.into(),
            exterior,
            type_of_area: None,
            position_indicator: None,
            wef: None,
            date_time_of_change: None,
            name_of_operator: None,
            origin: None,
            location: None,
            upper_limit: None,
            lower_limit: None,
            comment_1: None,
            comment_2: None,
            quality: None,
            crc_id: None,
            crc_pos: None,
            crc_tot: None,
            msid: None,
            idnr: None,
            mi_style: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestResult {
    pub areas: Vec<TmaArea>,
    pub skipped: Vec<String>,
}
