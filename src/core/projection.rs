//! WGS84 ↔ transverse Mercator reprojection (Snyder 1987, USGS formulas).
//!
//! Covers SWEREF 99 TM (EPSG:3006) and WGS84/UTM (EPSG:326xx, 327xx). Both are
//! transverse Mercator on (practically) the same ellipsoid and differ only in
//! central meridian and false northing, so one pair of series handles all of
//! them without linking libproj.

use crate::domain::model::{Crs, GeoRing, MetricRing};
use crate::utils::error::{CoordBufferError, Result};
use geo::{BoundingRect, Coord};
use serde::Deserialize;

// ── Ellipsoids ───────────────────────────────────────────────────────────

const SEMI_MAJOR_AXIS: f64 = 6_378_137.0; // metres, shared by WGS84 and GRS80
const WGS84_FLATTENING: f64 = 1.0 / 298.257_223_563;
const GRS80_FLATTENING: f64 = 1.0 / 298.257_222_101;

const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// The series lose accuracy quickly past this distance from the central meridian.
const MAX_MERIDIAN_OFFSET_DEG: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ProjectionMode {
    /// 固定使用設定中的公制 EPSG
    #[default]
    Fixed,
    /// 依範圍中心自動選 UTM 分帶
    Utm,
}

/// Picks the metric CRS for one run.
pub fn metric_crs_for(mode: ProjectionMode, metric_epsg: u32, ring: &GeoRing) -> Result<Crs> {
    match mode {
        ProjectionMode::Fixed => {
            let crs = Crs::from_epsg(metric_epsg)?;
            if crs.is_geographic() {
                return Err(CoordBufferError::projection(format!(
                    "{} is not a metric CRS",
                    crs
                )));
            }
            Ok(crs)
        }
        ProjectionMode::Utm => {
            let bounds = ring
                .line_string()
                .bounding_rect()
                .ok_or_else(|| CoordBufferError::projection("ring has no extent"))?;
            let center = bounds.center();
            Ok(utm_zone_for(center.x, center.y))
        }
    }
}

/// UTM zone containing (lon, lat); north hemisphere includes the equator.
pub fn utm_zone_for(lon: f64, lat: f64) -> Crs {
    let zone = (((lon + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u8;
    Crs::Utm {
        zone,
        north: lat >= 0.0,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TransverseMercator {
    a: f64,
    e2: f64,
    ep2: f64,
    lon0_deg: f64,
    false_northing: f64,
}

impl TransverseMercator {
    pub fn for_crs(crs: Crs) -> Result<Self> {
        let (flattening, lon0_deg, false_northing) = match crs {
            Crs::Wgs84 => {
                return Err(CoordBufferError::projection(
                    "EPSG:4326 is geographic, not a projection",
                ))
            }
            Crs::Sweref99Tm => (GRS80_FLATTENING, 15.0, 0.0),
            Crs::Utm { zone, north } => {
                let lon0 = (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0;
                let false_northing = if north { 0.0 } else { FALSE_NORTHING_SOUTH };
                (WGS84_FLATTENING, lon0, false_northing)
            }
        };
        let e2 = 2.0 * flattening - flattening * flattening;
        Ok(Self {
            a: SEMI_MAJOR_AXIS,
            e2,
            ep2: e2 / (1.0 - e2),
            lon0_deg,
            false_northing,
        })
    }

    /// (lon, lat) degrees → (easting, northing) metres. Snyder eq. 8-9, 8-10.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> Result<(f64, f64)> {
        if !(-90.0..=90.0).contains(&lat_deg) || !(-180.0..=180.0).contains(&lon_deg) {
            return Err(CoordBufferError::projection(format!(
                "coordinate ({}, {}) is outside WGS84 bounds",
                lon_deg, lat_deg
            )));
        }
        let mut dlon = lon_deg - self.lon0_deg;
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }
        if dlon.abs() > MAX_MERIDIAN_OFFSET_DEG {
            return Err(CoordBufferError::projection(format!(
                "longitude {} is {:.1}° from the central meridian {}",
                lon_deg,
                dlon.abs(),
                self.lon0_deg
            )));
        }

        let (easting, northing) = self.series_forward(dlon, lat_deg);
        finite_pair(easting, northing)
    }

    fn series_forward(&self, dlon: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let tan_lat = lat.tan();

        let n = self.a / (1.0 - self.e2 * sin_lat * sin_lat).sqrt();
        let t = tan_lat * tan_lat;
        let c = self.ep2 * cos_lat * cos_lat;
        let a_coeff = cos_lat * dlon.to_radians();
        let m = self.meridional_arc(lat);

        let a2 = a_coeff * a_coeff;
        let a4 = a2 * a2;
        let a6 = a4 * a2;

        let easting = K0
            * n
            * (a_coeff
                + (1.0 - t + c) * a2 * a_coeff / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.ep2) * a4 * a_coeff / 120.0)
            + FALSE_EASTING;

        let northing = K0
            * (m + n
                * tan_lat
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * self.ep2) * a6 / 720.0))
            + self.false_northing;

        (easting, northing)
    }

    /// (easting, northing) metres → (lon, lat) degrees. Snyder eq. 8-18 to 8-25.
    pub fn inverse(&self, easting: f64, northing: f64) -> Result<(f64, f64)> {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let root = (1.0 - e2).sqrt();
        let e1 = (1.0 - root) / (1.0 + root);

        let m = (northing - self.false_northing) / K0;
        let mu = m / (self.a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();

        let c1 = self.ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let w = 1.0 - e2 * sin_phi1 * sin_phi1;
        let n1 = self.a / w.sqrt();
        let r1 = self.a * (1.0 - e2) / w.powf(1.5);
        let d = (easting - FALSE_EASTING) / (n1 * K0);

        let d2 = d * d;
        let d4 = d2 * d2;
        let d6 = d4 * d2;

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * self.ep2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * self.ep2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);

        let lon = self.lon0_deg.to_radians()
            + (d - (1.0 + 2.0 * t1 + c1) * d2 * d / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * self.ep2 + 24.0 * t1 * t1)
                    * d4
                    * d
                    / 120.0)
                / cos_phi1;

        let (lon_deg, lat_deg) = finite_pair(lon.to_degrees(), lat.to_degrees())?;
        let (lon_deg, lat_deg) = self.refine(easting, northing, lon_deg, lat_deg);
        if lat_deg.abs() > 90.0 || lon_deg.abs() > 180.0 {
            return Err(CoordBufferError::projection(format!(
                "point ({}, {}) maps outside WGS84 bounds",
                easting, northing
            )));
        }
        Ok((lon_deg, lat_deg))
    }

    /// Newton steps on the forward series so forward(inverse(p)) == p to well
    /// under a millimetre; the two truncated series disagree by a few mm otherwise.
    fn refine(&self, easting: f64, northing: f64, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        const STEP: f64 = 1e-6;
        let (mut dlon, mut lat) = (lon_deg - self.lon0_deg, lat_deg);

        for _ in 0..4 {
            let (x, y) = self.series_forward(dlon, lat);
            let (rx, ry) = (easting - x, northing - y);
            if rx.hypot(ry) < 1e-9 {
                break;
            }
            let (x_lon, y_lon) = self.series_forward(dlon + STEP, lat);
            let (x_lat, y_lat) = self.series_forward(dlon, lat + STEP);
            let j11 = (x_lon - x) / STEP;
            let j21 = (y_lon - y) / STEP;
            let j12 = (x_lat - x) / STEP;
            let j22 = (y_lat - y) / STEP;
            let det = j11 * j22 - j12 * j21;
            if !det.is_finite() || det.abs() < f64::EPSILON {
                break;
            }
            let step_lon = (rx * j22 - ry * j12) / det;
            let step_lat = (ry * j11 - rx * j21) / det;
            if !(step_lon.is_finite() && step_lat.is_finite()) {
                break;
            }
            dlon += step_lon;
            lat += step_lat;
        }

        (dlon + self.lon0_deg, lat)
    }

    /// Meridional arc from the equator to `lat` (radians). Snyder eq. 3-21.
    fn meridional_arc(&self, lat: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        self.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
    }
}

fn finite_pair(x: f64, y: f64) -> Result<(f64, f64)> {
    if x.is_finite() && y.is_finite() {
        Ok((x, y))
    } else {
        Err(CoordBufferError::projection("transform produced a non-finite coordinate"))
    }
}

/// Moves rings between EPSG:4326 and one metric CRS, vertex by vertex.
#[derive(Debug, Clone, Copy)]
pub struct Reprojector {
    crs: Crs,
    projection: TransverseMercator,
}

impl Reprojector {
    pub fn new(crs: Crs) -> Result<Self> {
        Ok(Self {
            crs,
            projection: TransverseMercator::for_crs(crs)?,
        })
    }

    pub fn metric_crs(&self) -> Crs {
        self.crs
    }

    pub fn project(&self, ring: &GeoRing) -> Result<MetricRing> {
        let coords = ring
            .line_string()
            .coords()
            .map(|c| {
                self.projection
                    .forward(c.x, c.y)
                    .map(|(x, y)| Coord { x, y })
            })
            .collect::<Result<Vec<_>>>()?;
        MetricRing::new(coords, self.crs)
    }

    pub fn unproject(&self, ring: &MetricRing) -> Result<GeoRing> {
        if ring.crs() != self.crs {
            return Err(CoordBufferError::projection(format!(
                "ring is in {} but the reprojector is bound to {}",
                ring.crs(),
                self.crs
            )));
        }
        let coords = ring
            .line_string()
            .coords()
            .map(|c| {
                self.projection
                    .inverse(c.x, c.y)
                    .map(|(x, y)| Coord { x, y })
            })
            .collect::<Result<Vec<_>>>()?;
        GeoRing::from_coords(coords)
    }
}
