//! Integer distance functions of the TSPLIB edge weight types.
//!
//! Every function reproduces the rounding mandated by the format: `nint(x)` is
//! `floor(x + 0.5)`, applied to non-negative magnitudes only.

use crate::format::EdgeWeightType;

/// Earth radius (km) of the `GEO` weight type.
pub const EARTH_RADIUS: f64 = 6378.388;

/// Value of pi used by the `GEO` weight type; the truncated constant is part of the format.
pub const GEO_PI: f64 = 3.141592;

pub type Point2 = [f64; 2];
pub type Point3 = [f64; 3];

/// Rounds half up, i.e. `floor(x + 0.5)`.
pub fn nint(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// `EUC_2D`
pub fn euclidean_2d(a: Point2, b: Point2) -> i64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    nint((dx * dx + dy * dy).sqrt())
}

/// `EUC_3D`
pub fn euclidean_3d(a: Point3, b: Point3) -> i64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    nint((dx * dx + dy * dy + dz * dz).sqrt())
}

/// `ATT`: the result is `nint(r)` bumped by one whenever that rounds below `r`.
pub fn pseudo_euclidean_2d(a: Point2, b: Point2) -> i64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let r = ((dx * dx + dy * dy) / 10.0).sqrt();
    let t = nint(r);
    if (t as f64) < r { t + 1 } else { t }
}

/// `CEIL_2D`
pub fn ceil_euclidean_2d(a: Point2, b: Point2) -> i64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt().ceil() as i64
}

/// `MAN_2D`
pub fn manhattan_2d(a: Point2, b: Point2) -> i64 {
    nint((a[0] - b[0]).abs() + (a[1] - b[1]).abs())
}

/// `MAN_3D`
pub fn manhattan_3d(a: Point3, b: Point3) -> i64 {
    nint((a[0] - b[0]).abs() + (a[1] - b[1]).abs() + (a[2] - b[2]).abs())
}

/// `MAX_2D`: each axis is rounded before taking the maximum.
pub fn chebyshev_2d(a: Point2, b: Point2) -> i64 {
    nint((a[0] - b[0]).abs()).max(nint((a[1] - b[1]).abs()))
}

/// `MAX_3D`: each axis is rounded before taking the maximum.
pub fn chebyshev_3d(a: Point3, b: Point3) -> i64 {
    nint((a[0] - b[0]).abs())
        .max(nint((a[1] - b[1]).abs()))
        .max(nint((a[2] - b[2]).abs()))
}

/// `GEO`: coordinates are `(latitude, longitude)` encoded as `DDD.MM` (degrees, minutes).
/// The distance in km is truncated, not rounded.
pub fn geographic(a: Point2, b: Point2) -> i64 {
    let lat1 = ddmm_to_radians(a[0]);
    let lon1 = ddmm_to_radians(a[1]);
    let lat2 = ddmm_to_radians(b[0]);
    let lon2 = ddmm_to_radians(b[1]);

    let q1 = (lon1 - lon2).cos();
    let q2 = (lat1 - lat2).cos();
    let q3 = (lat1 + lat2).cos();

    let d = EARTH_RADIUS * (0.5 * ((1.0 + q1) * q2 - (1.0 - q1) * q3)).acos() + 1.0;
    d as i64
}

fn ddmm_to_radians(angle: f64) -> f64 {
    let degrees = angle.trunc();
    let minutes = angle - degrees;
    GEO_PI * (degrees + 5.0 * minutes / 3.0) / 180.0
}

/// The edge weight types that are computed from node coordinates by a fixed formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    Euclidean2d,
    Euclidean3d,
    PseudoEuclidean2d,
    CeilEuclidean2d,
    Manhattan2d,
    Manhattan3d,
    Chebyshev2d,
    Chebyshev3d,
    Geographic,
}

impl Metric {
    /// Returns the formula of `weight_type`, or `None` for `EXPLICIT`, `SPECIAL`
    /// and the crystallography types.
    pub fn from_weight_type(weight_type: EdgeWeightType) -> Option<Self> {
        match weight_type {
            EdgeWeightType::Euc2d => Some(Metric::Euclidean2d),
            EdgeWeightType::Euc3d => Some(Metric::Euclidean3d),
            EdgeWeightType::Att => Some(Metric::PseudoEuclidean2d),
            EdgeWeightType::Ceil2d => Some(Metric::CeilEuclidean2d),
            EdgeWeightType::Man2d => Some(Metric::Manhattan2d),
            EdgeWeightType::Man3d => Some(Metric::Manhattan3d),
            EdgeWeightType::Max2d => Some(Metric::Chebyshev2d),
            EdgeWeightType::Max3d => Some(Metric::Chebyshev3d),
            EdgeWeightType::Geo => Some(Metric::Geographic),
            EdgeWeightType::Explicit
            | EdgeWeightType::Xray1
            | EdgeWeightType::Xray2
            | EdgeWeightType::Special => None,
        }
    }

    /// Number of coordinates per point the formula reads.
    pub fn point_dimensions(&self) -> usize {
        match self {
            Metric::Euclidean3d | Metric::Manhattan3d | Metric::Chebyshev3d => 3,
            _ => 2,
        }
    }

    /// Computes the weight between two points.
    ///
    /// # Panics
    /// If a point has fewer than [`Metric::point_dimensions`] components.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> i64 {
        match self {
            Metric::Euclidean2d => euclidean_2d(point2(a), point2(b)),
            Metric::Euclidean3d => euclidean_3d(point3(a), point3(b)),
            Metric::PseudoEuclidean2d => pseudo_euclidean_2d(point2(a), point2(b)),
            Metric::CeilEuclidean2d => ceil_euclidean_2d(point2(a), point2(b)),
            Metric::Manhattan2d => manhattan_2d(point2(a), point2(b)),
            Metric::Manhattan3d => manhattan_3d(point3(a), point3(b)),
            Metric::Chebyshev2d => chebyshev_2d(point2(a), point2(b)),
            Metric::Chebyshev3d => chebyshev_3d(point3(a), point3(b)),
            Metric::Geographic => geographic(point2(a), point2(b)),
        }
    }
}

fn point2(p: &[f64]) -> Point2 {
    [p[0], p[1]]
}

fn point3(p: &[f64]) -> Point3 {
    [p[0], p[1], p[2]]
}
