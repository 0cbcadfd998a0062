//! Scalar and angle helpers shared by the layout and transform code.
//!
//! Everything here is a pure function of its inputs.
//!
//! # Conventions
//!
//! - Angles are in degrees. Positive angles rotate clockwise on screen (y points down).
//! - Rotations are normalized to the half-open range `(-180, 180]`.
//! - Box coordinates put (0, 0) at the top-left corner of a node's unrotated box.

use std::str::FromStr;

use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::error::RatioError;

/// Tolerance below which lengths and determinants are treated as zero.
pub const EPSILON: f64 = 1e-9;

/// Round `value` to `digits` decimal places.
///
/// Non-finite inputs are returned unchanged.
#[inline]
pub fn to_fixed(value: f64, digits: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let multiplier = 10f64.powi(digits as i32);
    (value * multiplier).round() / multiplier
}

/// Compare two values after rounding both to `digits` decimal places.
#[inline]
pub fn fixed_eq(a: f64, b: f64, digits: u32) -> bool {
    to_fixed(a, digits) == to_fixed(b, digits)
}

/// Normalize an angle in degrees into `(-180, 180]`.
pub fn normalize_rotation(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let mut r = degrees % 360.0;
    if r > 180.0 {
        r -= 360.0;
    } else if r <= -180.0 {
        r += 360.0;
    }
    r
}

/// Snap a rotation step to the rotation gap.
///
/// `add` is the requested change and `current` the rotation it is applied to.
/// The resulting absolute rotation is the nearest multiple of `gap`, and the
/// returned value is the step needed to reach it. A `gap` of zero (or any
/// non-positive or non-finite value) disables snapping.
pub fn gap_rotation(add: f64, gap: f64, current: f64) -> f64 {
    if !(gap > 0.0) || !gap.is_finite() {
        return add;
    }
    let target = ((add + current) / gap).round() * gap;
    target - current
}

/// Signed angle in degrees from `origin -> from` to `origin -> to`.
///
/// Returns `None` when either vector has (near) zero length, since the angle is
/// undefined there.
pub fn signed_angle(origin: Point, from: Point, to: Point) -> Option<f64> {
    let a = from - origin;
    let b = to - origin;
    if a.hypot() < EPSILON || b.hypot() < EPSILON {
        return None;
    }
    let radians = a.cross(b).atan2(a.dot(b));
    Some(normalize_rotation(radians.to_degrees()))
}

/// Inverse of an affine transform, or `None` if it is singular.
pub fn checked_inverse(affine: Affine) -> Option<Affine> {
    let det = affine.determinant();
    if det.abs() < EPSILON || !det.is_finite() {
        return None;
    }
    Some(affine.inverse())
}

/// Returns true if every coefficient of the transform is finite.
#[inline]
pub fn is_finite_affine(affine: Affine) -> bool {
    affine.as_coeffs().iter().all(|c| c.is_finite())
}

/// Point at fractional position `(fx, fy)` inside `rect`.
///
/// Zero-sized rectangles collapse every fraction onto the shared edge.
#[inline]
pub fn fraction_point(rect: Rect, fx: f64, fy: f64) -> Point {
    let width = if rect.width().is_finite() { rect.width() } else { 0.0 };
    let height = if rect.height().is_finite() { rect.height() } else { 0.0 };
    Point::new(rect.x0 + width * fx, rect.y0 + height * fy)
}

/// The eight compass directions of a box, clockwise from the top-left corner.
///
/// Odd indices are edge midpoints, even indices are corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    TopLeft = 0,
    Top = 1,
    TopRight = 2,
    Right = 3,
    BottomRight = 4,
    Bottom = 5,
    BottomLeft = 6,
    Left = 7,
}

impl Direction {
    /// All directions in index order.
    pub const ALL: [Direction; 8] = [
        Direction::TopLeft,
        Direction::Top,
        Direction::TopRight,
        Direction::Right,
        Direction::BottomRight,
        Direction::Bottom,
        Direction::BottomLeft,
        Direction::Left,
    ];

    /// Direction for an index, wrapping modulo 8.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 8]
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Fractional anchor position on a box: top-left is (0, 0), right is (1, 0.5).
    pub fn fraction(self) -> (f64, f64) {
        match self {
            Direction::TopLeft => (0.0, 0.0),
            Direction::Top => (0.5, 0.0),
            Direction::TopRight => (1.0, 0.0),
            Direction::Right => (1.0, 0.5),
            Direction::BottomRight => (1.0, 1.0),
            Direction::Bottom => (0.5, 1.0),
            Direction::BottomLeft => (0.0, 1.0),
            Direction::Left => (0.0, 0.5),
        }
    }

    /// The direction on the other side of the box.
    #[inline]
    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 4)
    }

    /// Edge midpoints (top, right, bottom, left).
    #[inline]
    pub fn is_edge(self) -> bool {
        self.index() % 2 == 1
    }

    /// Whether dragging this anchor changes the horizontal extent.
    #[inline]
    pub fn affects_x(self) -> bool {
        !matches!(self, Direction::Top | Direction::Bottom)
    }

    /// Whether dragging this anchor changes the vertical extent.
    #[inline]
    pub fn affects_y(self) -> bool {
        !matches!(self, Direction::Left | Direction::Right)
    }

    /// Anchor point of this direction on `rect`.
    #[inline]
    pub fn point_on(self, rect: Rect) -> Point {
        let (fx, fy) = self.fraction();
        fraction_point(rect, fx, fy)
    }
}

/// One of the four sides of a box, used for the rotation grip and button cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top = 0,
    Right = 1,
    #[default]
    Bottom = 2,
    Left = 3,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The edge midpoint direction on this side.
    #[inline]
    pub fn direction(self) -> Direction {
        Direction::from_index(self.index() * 2 + 1)
    }

    /// Left and right are horizontal offsets.
    #[inline]
    pub fn is_horizontal(self) -> bool {
        self.index() % 2 == 1
    }
}

/// Rotate a side index by a rotation in degrees, in steps of `360 / total`.
pub fn rotate_direction(index: usize, rotation: f64, total: usize) -> usize {
    let step = 360.0 / total as f64;
    let steps = (rotation / step).round() as i64;
    (index as i64 + steps).rem_euclid(total as i64) as usize
}

/// An aspect ratio such as `16:9`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ratio {
    pub width: f64,
    pub height: f64,
}

impl Ratio {
    /// Width divided by height.
    #[inline]
    pub fn value(&self) -> f64 {
        self.width / self.height
    }
}

impl FromStr for Ratio {
    type Err = RatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(':')
            .ok_or_else(|| RatioError::Malformed(s.to_string()))?;
        let width: f64 = w
            .trim()
            .parse()
            .map_err(|_| RatioError::Malformed(s.to_string()))?;
        let height: f64 = h
            .trim()
            .parse()
            .map_err(|_| RatioError::Malformed(s.to_string()))?;
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(RatioError::NonPositive(s.to_string()));
        }
        Ok(Ratio { width, height })
    }
}

/// Parse a `W:H` ratio string.
pub fn parse_ratio(s: &str) -> Result<Ratio, RatioError> {
    s.parse()
}
