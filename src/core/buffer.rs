//! Polygon buffering in metric space.
//!
//! Offsets every edge of the ring by the buffer distance (outward for positive
//! distances, inward for negative ones) and joins neighbouring offset edges
//! with a mitre, round or bevel corner. When growing a concave ring makes the
//! offset curve overlap itself, the outline is rebuilt as the union of the
//! polygon with the area swept by its offset edges and corners. Shrinking never
//! returns an inverted or collapsed ring: such results are reported as
//! degenerate instead.

use crate::domain::model::MetricRing;
use crate::utils::error::{CoordBufferError, Result};
use geo::{Area, BooleanOps, Coord, Intersects, Line, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use std::f64::consts::FRAC_PI_2;

/// Metres per nautical mile.
pub const NM_TO_M: f64 = 1852.0;

const COLLINEAR_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum BufferMultiplier {
    /// 1 NM = 1852 m
    #[default]
    Nautical,
    /// 1 NM = 3704 m, the "quick wide buffer"
    Doubled,
}

impl BufferMultiplier {
    pub fn factor(&self) -> f64 {
        match self {
            Self::Nautical => 1.0,
            Self::Doubled => 2.0,
        }
    }
}

pub fn nm_to_meters(buffer_nm: f64, multiplier: BufferMultiplier) -> f64 {
    buffer_nm * NM_TO_M * multiplier.factor()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum JoinStyle {
    #[default]
    Mitre,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Sided {
    /// 只取環外側（負距離時為內側）的偏移曲線，保留頂點順序
    #[default]
    Single,
    /// 偏移後再與原多邊形做聯集／交集
    Symmetric,
}

impl Sided {
    pub fn default_mitre_limit(&self) -> f64 {
        match self {
            Self::Single => 5.0,
            Self::Symmetric => 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BufferParams {
    /// Offset distance in metres (positive = grow, negative = shrink)
    pub distance: f64,
    pub join_style: JoinStyle,
    /// Largest allowed ratio between mitre length and distance
    pub mitre_limit: f64,
    pub sided: Sided,
    /// Segments per quarter circle for round joins
    pub quadrant_segments: usize,
}

impl BufferParams {
    pub fn new(distance: f64, join_style: JoinStyle, sided: Sided) -> Self {
        Self {
            distance,
            join_style,
            mitre_limit: sided.default_mitre_limit(),
            sided,
            quadrant_segments: 8,
        }
    }

    pub fn with_mitre_limit(mut self, mitre_limit: f64) -> Self {
        self.mitre_limit = mitre_limit;
        self
    }
}

/// Grows or shrinks a metric ring by `params.distance` metres.
///
/// A zero distance returns the ring unchanged. With [`Sided::Symmetric`] the
/// boolean step can split an eroded polygon in several parts; only the
/// largest part is kept.
pub fn buffer_ring(ring: &MetricRing, params: &BufferParams) -> Result<MetricRing> {
    if params.distance == 0.0 {
        return Ok(ring.clone());
    }
    if !params.distance.is_finite() {
        return Err(CoordBufferError::degenerate("buffer distance is not finite"));
    }

    let vertices = open_vertices(ring.line_string());
    if vertices.len() < 3 {
        return Err(CoordBufferError::degenerate(format!(
            "ring has {} distinct vertices",
            vertices.len()
        )));
    }

    let source_area = signed_area(&vertices);
    if source_area == 0.0 {
        return Err(CoordBufferError::degenerate("source ring has zero area"));
    }
    let orientation = source_area.signum();

    let offset = offset_curve(&vertices, orientation, params);
    let coords = if params.distance > 0.0 {
        grow(&vertices, offset, orientation, params)?
    } else {
        check_offset(&vertices, &offset, orientation, params.distance)?;
        match params.sided {
            Sided::Single => offset,
            Sided::Symmetric => combine_with_source(&vertices, offset, orientation, params.distance)?,
        }
    };

    tracing::debug!(
        "Buffered ring by {:.1} m: {} -> {} vertices",
        params.distance,
        vertices.len(),
        coords.len().saturating_sub(1)
    );
    MetricRing::new(coords, ring.crs())
}

/// Ring vertices without the closing point and without repeated neighbours.
fn open_vertices(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for c in ring.coords() {
        if out.last() != Some(c) {
            out.push(*c);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

fn closed(vertices: &[Coord<f64>]) -> LineString<f64> {
    let mut coords = vertices.to_vec();
    if let Some(first) = vertices.first() {
        coords.push(*first);
    }
    LineString::new(coords)
}

/// Positive for counter-clockwise rings.
fn signed_area(vertices: &[Coord<f64>]) -> f64 {
    Polygon::new(closed(vertices), vec![]).signed_area()
}

fn unit(v: Coord<f64>) -> Coord<f64> {
    let len = v.x.hypot(v.y);
    Coord {
        x: v.x / len,
        y: v.y / len,
    }
}

fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.x + a.y * b.y
}

fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Normal pointing away from the polygon interior.
fn outward_normal(direction: Coord<f64>, orientation: f64) -> Coord<f64> {
    Coord {
        x: orientation * direction.y,
        y: -orientation * direction.x,
    }
}

fn offset_curve(vertices: &[Coord<f64>], orientation: f64, params: &BufferParams) -> Vec<Coord<f64>> {
    let n = vertices.len();
    let d = params.distance;
    let mut out = Vec::with_capacity(n + 1);

    for i in 0..n {
        let prev = vertices[(i + n - 1) % n];
        let curr = vertices[i];
        let next = vertices[(i + 1) % n];

        let u0 = unit(curr - prev);
        let u1 = unit(next - curr);
        let n0 = outward_normal(u0, orientation);
        let n1 = outward_normal(u1, orientation);
        let a = curr + n0 * d;
        let b = curr + n1 * d;

        let turn = cross(u0, u1);
        if turn.abs() < COLLINEAR_EPS {
            out.push(a);
            if dot(u0, u1) < 0.0 {
                // 180° 折返
                out.push(b);
            }
            continue;
        }

        // 偏移線在凸角（相對偏移方向）分開，需要補角；否則取交點
        let diverging = orientation * turn * d > 0.0;
        if diverging {
            join_corner(&mut out, curr, (a, u0, n0), (b, u1, n1), params);
        } else {
            let t = cross(b - a, u1) / turn;
            out.push(a + u0 * t);
        }
    }

    if let Some(first) = out.first().copied() {
        out.push(first);
    }
    out
}

type OffsetEdge = (Coord<f64>, Coord<f64>, Coord<f64>);

fn join_corner(
    out: &mut Vec<Coord<f64>>,
    vertex: Coord<f64>,
    (a, u0, n0): OffsetEdge,
    (b, u1, n1): OffsetEdge,
    params: &BufferParams,
) {
    let d = params.distance;
    match params.join_style {
        JoinStyle::Bevel => {
            out.push(a);
            out.push(b);
        }
        JoinStyle::Mitre => {
            let cos_theta = dot(n0, n1);
            let ratio = (2.0 / (1.0 + cos_theta)).sqrt();
            if ratio <= params.mitre_limit {
                out.push(vertex + (n0 + n1) * (d / (1.0 + cos_theta)));
            } else {
                // 超過斜接上限：在 limit * d 處沿角平分線的垂線截平
                let bisector = unit(n0 + n1);
                let target = params.mitre_limit * d;
                let t0 = (target - d * dot(n0, bisector)) / dot(u0, bisector);
                let t1 = (target - d * dot(n1, bisector)) / dot(u1, bisector);
                out.push(a + u0 * t0);
                out.push(b + u1 * t1);
            }
        }
        JoinStyle::Round => {
            let radius = d.abs();
            let start = (a.y - vertex.y).atan2(a.x - vertex.x);
            let end = (b.y - vertex.y).atan2(b.x - vertex.x);
            let mut sweep = end - start;
            if sweep > std::f64::consts::PI {
                sweep -= std::f64::consts::TAU;
            } else if sweep <= -std::f64::consts::PI {
                sweep += std::f64::consts::TAU;
            }
            let step = FRAC_PI_2 / params.quadrant_segments.max(1) as f64;
            let steps = (sweep.abs() / step).ceil().max(1.0) as usize;

            out.push(a);
            for k in 1..steps {
                let angle = start + sweep * k as f64 / steps as f64;
                out.push(Coord {
                    x: vertex.x + radius * angle.cos(),
                    y: vertex.y + radius * angle.sin(),
                });
            }
            out.push(b);
        }
    }
}

fn point_segment_distance(p: Coord<f64>, s0: Coord<f64>, s1: Coord<f64>) -> f64 {
    let seg = s1 - s0;
    let len2 = dot(seg, seg);
    let t = if len2 == 0.0 {
        0.0
    } else {
        (dot(p - s0, seg) / len2).clamp(0.0, 1.0)
    };
    let closest = s0 + seg * t;
    (p.x - closest.x).hypot(p.y - closest.y)
}

/// Rejects offset curves that collapsed, turned inside out or cross themselves.
fn check_offset(
    source: &[Coord<f64>],
    offset: &[Coord<f64>],
    orientation: f64,
    distance: f64,
) -> Result<()> {
    let vertices = open_vertices(&LineString::new(offset.to_vec()));
    if vertices.len() < 3 {
        return Err(CoordBufferError::degenerate(
            "buffer collapses the polygon to fewer than 3 vertices",
        ));
    }

    let area = signed_area(&vertices);
    if area == 0.0 || area.signum() != orientation {
        return Err(CoordBufferError::degenerate(
            "buffer collapses or inverts the polygon",
        ));
    }

    // 每個偏移頂點與原邊界的距離都不得小於緩衝距離
    let tolerance = distance.abs() * 1e-9 + 1e-6;
    let n = source.len();
    for p in &vertices {
        let nearest = (0..n)
            .map(|i| point_segment_distance(*p, source[i], source[(i + 1) % n]))
            .fold(f64::INFINITY, f64::min);
        if nearest + tolerance < distance.abs() {
            return Err(CoordBufferError::degenerate(format!(
                "buffer of {:.1} m overlaps the polygon itself",
                distance
            )));
        }
    }

    let m = vertices.len();
    let edges: Vec<Line<f64>> = (0..m)
        .map(|i| Line::new(vertices[i], vertices[(i + 1) % m]))
        .collect();
    for i in 0..m {
        for j in (i + 2)..m {
            if i == 0 && j == m - 1 {
                continue;
            }
            if edges[i].intersects(&edges[j]) {
                return Err(CoordBufferError::degenerate(
                    "buffered ring intersects itself",
                ));
            }
        }
    }
    Ok(())
}

/// Outward buffer. A clean offset curve is used as is; when concave parts make
/// it overlap itself, the result is the union of the polygon with the area
/// swept by every offset edge and corner join.
fn grow(
    source: &[Coord<f64>],
    offset: Vec<Coord<f64>>,
    orientation: f64,
    params: &BufferParams,
) -> Result<Vec<Coord<f64>>> {
    if let Err(e) = check_offset(source, &offset, orientation, params.distance) {
        tracing::debug!("Offset curve rejected ({}), resolving by union", e);
        let merged = swept_union(source, orientation, params);
        return primary_exterior(merged).map(|coords| with_orientation(coords, orientation));
    }
    match params.sided {
        Sided::Single => Ok(offset),
        Sided::Symmetric => combine_with_source(source, offset, orientation, params.distance),
    }
}

/// Source polygon ∪ one quad per edge ∪ one wedge per convex corner.
fn swept_union(source: &[Coord<f64>], orientation: f64, params: &BufferParams) -> MultiPolygon<f64> {
    let n = source.len();
    let d = params.distance;
    let mut pieces = vec![Polygon::new(closed(source), vec![])];

    for i in 0..n {
        let curr = source[i];
        let next = source[(i + 1) % n];
        let after = source[(i + 2) % n];

        let u0 = unit(next - curr);
        let n0 = outward_normal(u0, orientation);
        pieces.push(Polygon::new(
            closed(&[curr, next, next + n0 * d, curr + n0 * d]),
            vec![],
        ));

        let u1 = unit(after - next);
        let turn = cross(u0, u1);
        if turn.abs() < COLLINEAR_EPS || orientation * turn <= 0.0 {
            continue;
        }
        let n1 = outward_normal(u1, orientation);
        let a = next + n0 * d;
        let b = next + n1 * d;
        let mut corner = Vec::new();
        join_corner(&mut corner, next, (a, u0, n0), (b, u1, n1), params);

        let mut wedge = vec![next, a];
        for p in corner.into_iter().chain(std::iter::once(b)) {
            if wedge.last() != Some(&p) {
                wedge.push(p);
            }
        }
        pieces.push(Polygon::new(closed(&wedge), vec![]));
    }

    union_all(pieces)
}

/// 兩兩合併，避免單一累積多邊形越滾越大
fn union_all(pieces: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    let mut level: Vec<MultiPolygon<f64>> = pieces
        .into_iter()
        .map(|p| MultiPolygon::new(vec![p]))
        .collect();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut iter = level.into_iter();
        while let Some(first) = iter.next() {
            match iter.next() {
                Some(second) => next.push(first.union(&second)),
                None => next.push(first),
            }
        }
        level = next;
    }
    level.pop().unwrap_or_else(|| MultiPolygon::new(vec![]))
}

/// Reverses a closed ring when its winding differs from `orientation`.
fn with_orientation(mut coords: Vec<Coord<f64>>, orientation: f64) -> Vec<Coord<f64>> {
    if Polygon::new(LineString::new(coords.clone()), vec![]).signed_area().signum() != orientation {
        coords.reverse();
    }
    coords
}

fn combine_with_source(
    source: &[Coord<f64>],
    offset: Vec<Coord<f64>>,
    orientation: f64,
    distance: f64,
) -> Result<Vec<Coord<f64>>> {
    let source = Polygon::new(closed(source), vec![]);
    let offset = Polygon::new(LineString::new(offset), vec![]);
    let merged = if distance > 0.0 {
        source.union(&offset)
    } else {
        source.intersection(&offset)
    };
    primary_exterior(merged).map(|coords| with_orientation(coords, orientation))
}

/// The exterior ring of the largest polygon. Holes and smaller parts are dropped.
fn primary_exterior(polygons: MultiPolygon<f64>) -> Result<Vec<Coord<f64>>> {
    if polygons.0.len() > 1 {
        tracing::warn!(
            "Buffer produced {} disjoint polygons, keeping the largest",
            polygons.0.len()
        );
    }
    let largest = polygons
        .0
        .into_iter()
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
        .ok_or_else(|| CoordBufferError::degenerate("buffer produced an empty polygon"))?;

    if largest.unsigned_area() == 0.0 {
        return Err(CoordBufferError::degenerate("buffer produced an empty polygon"));
    }
    if !largest.interiors().is_empty() {
        tracing::warn!("Dropping {} interior rings", largest.interiors().len());
    }
    Ok(largest.exterior().0.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Crs;
    use geo::Contains;

    fn square(side: f64, counter_clockwise: bool) -> MetricRing {
        let mut coords = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: side, y: 0.0 },
            Coord { x: side, y: side },
            Coord { x: 0.0, y: side },
        ];
        if !counter_clockwise {
            coords.reverse();
        }
        MetricRing::new(coords, Crs::Sweref99Tm).unwrap()
    }

    fn area(ring: &MetricRing) -> f64 {
        Polygon::new(ring.line_string().clone(), vec![]).signed_area()
    }

    fn assert_coord(c: &Coord<f64>, x: f64, y: f64) {
        assert!(
            (c.x - x).abs() < 1e-9 && (c.y - y).abs() < 1e-9,
            "expected ({x}, {y}), got ({}, {})",
            c.x,
            c.y
        );
    }

    #[test]
    fn test_nm_to_meters() {
        assert_eq!(nm_to_meters(5.0, BufferMultiplier::Nautical), 9260.0);
        assert_eq!(nm_to_meters(5.0, BufferMultiplier::Doubled), 18520.0);
        assert_eq!(nm_to_meters(-1.0, BufferMultiplier::Nautical), -1852.0);
    }

    #[test]
    fn test_zero_distance_is_identity() {
        let ring = square(1000.0, true);
        for sided in [Sided::Single, Sided::Symmetric] {
            let params = BufferParams::new(0.0, JoinStyle::Mitre, sided);
            assert_eq!(buffer_ring(&ring, &params).unwrap(), ring);
        }
    }

    #[test]
    fn test_single_sided_mitre_square() {
        let ring = square(1000.0, true);
        let params = BufferParams::new(100.0, JoinStyle::Mitre, Sided::Single);
        let out = buffer_ring(&ring, &params).unwrap();
        let coords = &out.line_string().0;

        assert_eq!(coords.len(), 5);
        assert_coord(&coords[0], -100.0, -100.0);
        assert_coord(&coords[1], 1100.0, -100.0);
        assert_coord(&coords[2], 1100.0, 1100.0);
        assert_coord(&coords[3], -100.0, 1100.0);
        assert!((area(&out) - 1200.0 * 1200.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_sided_keeps_clockwise_order() {
        let ring = square(1000.0, false);
        let params = BufferParams::new(100.0, JoinStyle::Mitre, Sided::Single);
        let out = buffer_ring(&ring, &params).unwrap();
        assert!(area(&out) < 0.0);
        assert!((area(&out).abs() - 1200.0 * 1200.0).abs() < 1e-6);
        assert_coord(&out.line_string().0[0], -100.0, 1100.0);
    }

    #[test]
    fn test_symmetric_mitre_square() {
        let ring = square(1000.0, true);
        let params = BufferParams::new(100.0, JoinStyle::Mitre, Sided::Symmetric);
        let out = buffer_ring(&ring, &params).unwrap();
        assert!((area(&out).abs() - 1200.0 * 1200.0).abs() < 1e-3);
    }

    #[test]
    fn test_bevel_cuts_corners() {
        let ring = square(1000.0, true);
        let params = BufferParams::new(100.0, JoinStyle::Bevel, Sided::Single);
        let out = buffer_ring(&ring, &params).unwrap();
        assert_eq!(out.line_string().0.len(), 9);
        let expected = 1200.0 * 1200.0 - 4.0 * (100.0 * 100.0 / 2.0);
        assert!((area(&out) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_round_join_approximates_arcs() {
        let ring = square(1000.0, true);
        let params = BufferParams::new(100.0, JoinStyle::Round, Sided::Single);
        let out = buffer_ring(&ring, &params).unwrap();
        let expected = 1000.0 * 1000.0 + 4.0 * 1000.0 * 100.0 + std::f64::consts::PI * 100.0 * 100.0;
        let error = (area(&out) - expected).abs() / expected;
        assert!(error < 0.005, "round buffer area off by {:.3}%", error * 100.0);
    }

    #[test]
    fn test_mitre_limit_clips_acute_corner() {
        let ring = MetricRing::new(
            vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1000.0, y: 0.0 },
                Coord { x: 0.0, y: 100.0 },
            ],
            Crs::Sweref99Tm,
        )
        .unwrap();
        let params = BufferParams::new(10.0, JoinStyle::Mitre, Sided::Single);
        let out = buffer_ring(&ring, &params).unwrap();
        let coords = &out.line_string().0;

        // 銳角被截成兩點；不截的話尖端會伸到 x ≈ 1200
        assert_eq!(coords.len(), 5);
        let max_x = coords.iter().map(|c| c.x).fold(f64::MIN, f64::max);
        assert!(max_x > 1040.0 && max_x < 1055.0, "tip reaches x = {max_x}");
    }

    #[test]
    fn test_negative_distance_shrinks() {
        let ring = square(1000.0, true);
        let params = BufferParams::new(-100.0, JoinStyle::Mitre, Sided::Single);
        let out = buffer_ring(&ring, &params).unwrap();
        assert!((area(&out) - 800.0 * 800.0).abs() < 1e-6);
        assert_coord(&out.line_string().0[0], 100.0, 100.0);
    }

    #[test]
    fn test_erosion_beyond_extent_is_degenerate() {
        let ring = square(1000.0, true);
        for sided in [Sided::Single, Sided::Symmetric] {
            let params = BufferParams::new(-600.0, JoinStyle::Mitre, sided);
            let err = buffer_ring(&ring, &params).unwrap_err();
            assert!(matches!(err, CoordBufferError::DegenerateGeometryError { .. }));
        }
    }

    #[test]
    fn test_erosion_exactly_to_a_point_is_degenerate() {
        let ring = square(1000.0, true);
        let params = BufferParams::new(-500.0, JoinStyle::Mitre, Sided::Single);
        assert!(buffer_ring(&ring, &params).is_err());
    }

    /// U 形：中間缺口寬 200 m，兩臂寬 100 m
    fn u_shape() -> MetricRing {
        MetricRing::new(
            vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 400.0, y: 0.0 },
                Coord { x: 400.0, y: 1000.0 },
                Coord { x: 300.0, y: 1000.0 },
                Coord { x: 300.0, y: 100.0 },
                Coord { x: 100.0, y: 100.0 },
                Coord { x: 100.0, y: 1000.0 },
                Coord { x: 0.0, y: 1000.0 },
            ],
            Crs::Sweref99Tm,
        )
        .unwrap()
    }

    fn min_distance_to_ring(p: Coord<f64>, ring: &MetricRing) -> f64 {
        let coords = &ring.line_string().0;
        coords
            .windows(2)
            .map(|w| point_segment_distance(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min)
    }

    fn assert_encloses(out: &MetricRing, ring: &MetricRing) {
        let polygon = Polygon::new(out.line_string().clone(), vec![]);
        for c in ring.line_string().coords() {
            assert!(polygon.contains(c), "({}, {}) not enclosed", c.x, c.y);
        }
    }

    #[test]
    fn test_concave_notch_too_narrow_for_erosion() {
        let ring = u_shape();
        let params = BufferParams::new(-80.0, JoinStyle::Mitre, Sided::Single);
        assert!(buffer_ring(&ring, &params).is_err());

        let params = BufferParams::new(-20.0, JoinStyle::Mitre, Sided::Single);
        assert!(buffer_ring(&ring, &params).is_ok());
    }

    #[test]
    fn test_growing_u_shape_fills_the_gap() {
        let ring = u_shape();
        for sided in [Sided::Single, Sided::Symmetric] {
            let params = BufferParams::new(150.0, JoinStyle::Mitre, sided);
            let out = buffer_ring(&ring, &params).unwrap();

            // 缺口寬度小於兩倍緩衝距離，外框變成 700 x 1300 的矩形
            assert!(area(&out) > area(&ring), "{:?}", sided);
            assert!((area(&out) - 700.0 * 1300.0).abs() < 1.0, "{:?}: {}", sided, area(&out));
            assert_encloses(&out, &ring);
            for c in out.line_string().coords() {
                assert!(min_distance_to_ring(*c, &ring) > 150.0 - 1e-3);
            }
        }
    }

    #[test]
    fn test_growing_clockwise_u_shape_keeps_orientation() {
        let mut coords = u_shape().line_string().0.clone();
        coords.reverse();
        let ring = MetricRing::new(coords, Crs::Sweref99Tm).unwrap();
        let params = BufferParams::new(150.0, JoinStyle::Round, Sided::Single);
        let out = buffer_ring(&ring, &params).unwrap();
        assert!(area(&out) < 0.0);
        assert!(area(&out).abs() > area(&ring).abs());
    }

    #[test]
    fn test_growing_square_with_small_notch() {
        // 1000 m 正方形，上緣中央有 50 x 50 m 的凹口
        let ring = MetricRing::new(
            vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1000.0, y: 0.0 },
                Coord { x: 1000.0, y: 1000.0 },
                Coord { x: 525.0, y: 1000.0 },
                Coord { x: 525.0, y: 950.0 },
                Coord { x: 475.0, y: 950.0 },
                Coord { x: 475.0, y: 1000.0 },
                Coord { x: 0.0, y: 1000.0 },
            ],
            Crs::Sweref99Tm,
        )
        .unwrap();
        for join_style in [JoinStyle::Mitre, JoinStyle::Round, JoinStyle::Bevel] {
            let params = BufferParams::new(100.0, join_style, Sided::Single);
            let out = buffer_ring(&ring, &params).unwrap();
            assert!(area(&out) > 1000.0 * 1000.0, "{:?}", join_style);
            assert_encloses(&out, &ring);
        }

        let params = BufferParams::new(100.0, JoinStyle::Mitre, Sided::Single);
        let out = buffer_ring(&ring, &params).unwrap();
        assert!((area(&out) - 1200.0 * 1200.0).abs() < 1.0);
    }

    #[test]
    fn test_buffer_keeps_crs() {
        let ring = square(1000.0, true);
        let params = BufferParams::new(50.0, JoinStyle::Mitre, Sided::Single);
        assert_eq!(buffer_ring(&ring, &params).unwrap().crs(), Crs::Sweref99Tm);
    }
}
