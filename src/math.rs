//! Geometry primitives on top of glam.
//!
//! The world is Y-up. "Horizontal" helpers work in the XZ plane, which is
//! the plane reorientations rotate in.

use glam::{Quat, Vec2, Vec3};

/// Extension trait for the horizontal-plane operations the engine needs on `Vec3`.
pub trait HorizontalExt {
    /// Rotate about the vertical axis by `angle` radians.
    fn yrot(self, angle: f32) -> Vec3;

    /// Yaw of the horizontal component, measured from +Z towards +X.
    fn heading(self) -> f32;

    /// Drop the vertical component.
    fn xz(self) -> Vec2;

    /// Negate the lateral (x) coordinate.
    fn mirrored_x(self) -> Vec3;
}

impl HorizontalExt for Vec3 {
    #[inline]
    fn yrot(self, angle: f32) -> Vec3 {
        Quat::from_rotation_y(angle) * self
    }

    #[inline]
    fn heading(self) -> f32 {
        self.x.atan2(self.z)
    }

    #[inline]
    fn xz(self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    #[inline]
    fn mirrored_x(self) -> Vec3 {
        Vec3::new(-self.x, self.y, self.z)
    }
}

/// Sign of the turn a -> b -> c in the plane (positive is counter-clockwise).
#[inline]
fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

/// A 2D screen-space segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub a: Vec2,
    pub b: Vec2,
}

impl LineSegment {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    pub fn length(&self) -> f32 {
        self.a.distance(self.b)
    }

    /// Proper intersection test.
    ///
    /// Segments that merely touch (shared endpoints, an endpoint lying on the
    /// other segment, collinear overlap) do not count. Paths drawn from one
    /// keyframe to the next always share endpoints, so only true crossings
    /// are reported.
    pub fn intersects(&self, other: &LineSegment) -> bool {
        let d1 = orientation(other.a, other.b, self.a);
        let d2 = orientation(other.a, other.b, self.b);
        let d3 = orientation(self.a, self.b, other.a);
        let d4 = orientation(self.a, self.b, other.b);

        ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    }

    /// Parameter in [0, 1] of the point on the segment closest to `p`.
    ///
    /// Degenerate segments report 0.
    pub fn closest_fraction(&self, p: Vec2) -> f32 {
        let ab = self.b - self.a;
        let len_sq = ab.length_squared();
        if len_sq < f32::EPSILON {
            return 0.0;
        }
        ((p - self.a).dot(ab) / len_sq).clamp(0.0, 1.0)
    }

    pub fn point_at(&self, t: f32) -> Vec2 {
        self.a.lerp(self.b, t)
    }
}

/// Sum of squared distances between paired points.
pub fn sum_distance_squared<'a>(
    a: impl IntoIterator<Item = &'a Vec3>,
    b: impl IntoIterator<Item = &'a Vec3>,
) -> f32 {
    a.into_iter()
        .zip(b)
        .map(|(p, q)| p.distance_squared(*q))
        .sum()
}
