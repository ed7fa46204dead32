// Planar (XZ) geometry helpers shared by extraction, refinement and growth.

use crate::geometry::tolerance::{clamp, EPS_LEN};
use crate::model::Vec3;

/// Perp-dot of two direction vectors in the XZ plane.
///
/// Positive when `b` lies clockwise of `a` (looking down the +Y axis),
/// negative when counter-clockwise, zero when colinear.
#[inline]
pub fn dot_perp(a: Vec3, b: Vec3) -> f32 {
    a.x * b.z - a.z * b.x
}

/// Unit left perpendicular of the segment v1 -> v2, in the XZ plane.
pub fn left_perpendicular(v1: Vec3, v2: Vec3) -> Vec3 {
    Vec3::new(-(v2.z - v1.z), 0.0, v2.x - v1.x).normalized()
}

/// Unit right perpendicular of the segment v1 -> v2, in the XZ plane.
pub fn right_perpendicular(v1: Vec3, v2: Vec3) -> Vec3 {
    Vec3::new(v2.z - v1.z, 0.0, -(v2.x - v1.x)).normalized()
}

/// Whichever perpendicular of v1 -> v2 points toward `point`.
pub fn perpendicular_toward(v1: Vec3, v2: Vec3, point: Vec3) -> Vec3 {
    let mid = Vec3::midpoint(v1, v2);
    let left = left_perpendicular(v1, v2);
    if (mid + left).distance(point) <= (mid - left).distance(point) {
        left
    } else {
        -left
    }
}

/// Angle between two directions in degrees, in [0, 180].
pub fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    let an = a.normalized();
    let bn = b.normalized();
    if an == Vec3::ZERO || bn == Vec3::ZERO {
        return 0.0;
    }
    clamp(an.dot(bn), -1.0, 1.0).acos().to_degrees()
}

/// Closest point to `p` on the segment a -> b.
pub fn closest_point_on_segment(a: Vec3, b: Vec3, p: Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq <= EPS_LEN {
        return a;
    }
    let t = clamp((p - a).dot(ab) / len_sq, 0.0, 1.0);
    a + ab * t
}

/// Even-odd sign test for a point against a triangle, XZ plane.
/// Points on an edge count as inside.
pub fn point_in_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> bool {
    let d1 = dot_perp(p - a, b - a);
    let d2 = dot_perp(p - b, c - b);
    let d3 = dot_perp(p - c, a - c);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
