//! Integer lattice geometry: points, axes, and axis-aligned boxes.
//!
//! All coordinates are in lattice units. Nodes sit on every other unit (one
//! step between neighbouring nodes is 2 units), so an edge midpoint is always
//! an integer point and can be used as a lookup key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// One of the three lattice axes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Axis {
    /// The X axis.
    X,
    /// The Y axis.
    Y,
    /// The Z axis.
    Z,
}

impl Axis {
    /// All three axes in X, Y, Z order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Returns the axis index (0 for X, 1 for Y, 2 for Z).
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// A point on the integer lattice.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct Point3 {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl Point3 {
    /// The lattice origin.
    pub const ORIGIN: Point3 = Point3 { x: 0, y: 0, z: 0 };

    /// Creates a point from its coordinates.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the coordinate along `axis`.
    pub fn get(self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Returns a copy with the coordinate along `axis` replaced.
    pub fn with(self, axis: Axis, value: i32) -> Self {
        let mut p = self;
        match axis {
            Axis::X => p.x = value,
            Axis::Y => p.y = value,
            Axis::Z => p.z = value,
        }
        p
    }

    /// Returns a copy moved by `delta` along `axis`.
    pub fn offset(self, axis: Axis, delta: i32) -> Self {
        self.with(axis, self.get(axis) + delta)
    }

    /// Manhattan distance to `other`.
    pub fn manhattan(self, other: Point3) -> i64 {
        let d = other - self;
        i64::from(d.x).abs() + i64::from(d.y).abs() + i64::from(d.z).abs()
    }

    /// Squared Euclidean distance to `other`.
    pub fn distance_squared(self, other: Point3) -> i64 {
        let d = other - self;
        let (x, y, z) = (i64::from(d.x), i64::from(d.y), i64::from(d.z));
        x * x + y * y + z * z
    }

    /// Rotates the point 90 degrees counter-clockwise about `axis` through the origin.
    ///
    /// Four successive rotations about the same axis return the original point.
    pub fn rotated(self, axis: Axis) -> Self {
        let Point3 { x, y, z } = self;
        match axis {
            Axis::X => Point3::new(x, -z, y),
            Axis::Y => Point3::new(z, y, -x),
            Axis::Z => Point3::new(-y, x, z),
        }
    }

    /// Returns the point scaled by 2 (used for exact half-unit arithmetic).
    pub fn doubled(self) -> Self {
        Point3::new(self.x * 2, self.y * 2, self.z * 2)
    }

    /// Halves every coordinate, or returns `None` if any coordinate is odd.
    pub fn halved(self) -> Option<Self> {
        if self.x % 2 != 0 || self.y % 2 != 0 || self.z % 2 != 0 {
            return None;
        }
        Some(Point3::new(self.x / 2, self.y / 2, self.z / 2))
    }

    /// Returns the component-wise minimum of two points.
    pub fn min(self, other: Point3) -> Self {
        Point3::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Returns the component-wise maximum of two points.
    pub fn max(self, other: Point3) -> Self {
        Point3::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// If `self` and `other` differ along exactly one axis, returns that axis.
    pub fn axis_to(self, other: Point3) -> Option<Axis> {
        let d = other - self;
        match (d.x != 0, d.y != 0, d.z != 0) {
            (true, false, false) => Some(Axis::X),
            (false, true, false) => Some(Axis::Y),
            (false, false, true) => Some(Axis::Z),
            _ => None,
        }
    }
}

impl Add for Point3 {
    type Output = Point3;

    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Point3 {
    type Output = Point3;

    fn neg(self) -> Point3 {
        Point3::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// An axis-aligned box with inclusive integer corners.
///
/// Boxes that only share a face do not [overlap](Self::overlaps); that is how
/// modules are packed with zero gaps.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl BoundingBox {
    /// Creates a box from two corners, normalizing their order.
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// A degenerate box around a single point.
    pub fn point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// The smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::point(first), |bb, p| bb.including(p)))
    }

    /// Returns the extent along each axis (`max - min`).
    pub fn size(&self) -> Point3 {
        self.max - self.min
    }

    /// Returns the box grown to include `p`.
    pub fn including(self, p: Point3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// Returns the smallest box containing both boxes.
    pub fn union(self, other: BoundingBox) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the box grown by `margin` on every side.
    pub fn padded(self, margin: i32) -> Self {
        let m = Point3::new(margin, margin, margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Returns the box moved by `delta`.
    pub fn translated(self, delta: Point3) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Returns `true` if `p` lies inside or on the boundary.
    pub fn contains(&self, p: Point3) -> bool {
        Axis::ALL
            .iter()
            .all(|&a| self.min.get(a) <= p.get(a) && p.get(a) <= self.max.get(a))
    }

    /// Returns `true` if `p` lies strictly inside (not on any face).
    pub fn contains_strict(&self, p: Point3) -> bool {
        Axis::ALL
            .iter()
            .all(|&a| self.min.get(a) < p.get(a) && p.get(a) < self.max.get(a))
    }

    /// Returns `true` if the interiors of the two boxes intersect.
    ///
    /// Two boxes do not overlap when `a.max <= b.min` (or the reverse) holds
    /// on at least one axis.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        Axis::ALL.iter().all(|&a| {
            self.min.get(a) < other.max.get(a) && other.min.get(a) < self.max.get(a)
        })
    }

    /// Surface area of the box.
    pub fn surface_area(&self) -> i64 {
        let s = self.size();
        let (w, h, d) = (i64::from(s.x), i64::from(s.y), i64::from(s.z));
        2 * (w * h + h * d + w * d)
    }

    /// Volume of the box.
    pub fn volume(&self) -> i64 {
        let s = self.size();
        i64::from(s.x) * i64::from(s.y) * i64::from(s.z)
    }

    /// The box center in doubled coordinates (`min + max`), exact for odd sizes.
    pub fn center_doubled(&self) -> Point3 {
        self.min + self.max
    }

    /// Length of the space diagonal.
    pub fn diagonal(&self) -> f64 {
        let s = self.size();
        let (w, h, d) = (f64::from(s.x), f64::from(s.y), f64::from(s.z));
        (w * w + h * h + d * d).sqrt()
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.min, self.max)
    }
}
