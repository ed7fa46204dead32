// Robust segment-segment intersection in the XZ plane.
// f64 internals with orientation pre-tests; classifies crossings
// (endpoint touches included) and collinear overlaps.

use crate::geometry::tolerance::{EPS_DENOM, EPS_POS};
use crate::model::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegHit {
    Miss,
    /// Segments cross (endpoint touches within tolerance included).
    /// `t` parametrizes AB, `u` parametrizes CD; (x, z) is the point.
    Cross { t: f64, u: f64, x: f64, z: f64 },
    /// Collinear overlapping span, parameter ranges on each segment.
    Collinear { t0: f64, t1: f64, u0: f64, u1: f64 },
}

#[inline]
fn orient(ax: f64, az: f64, bx: f64, bz: f64, cx: f64, cz: f64) -> f64 {
    (bx - ax) * (cz - az) - (bz - az) * (cx - ax)
}

#[inline]
fn within_eps(x: f64, eps: f64) -> bool {
    x.abs() <= eps
}

// Project both segments onto the dominant axis of AB and compute the
// shared parameter span.
fn collinear_span(
    ax: f64, az: f64, bx: f64, bz: f64,
    cx: f64, cz: f64, dx: f64, dz: f64,
    eps: f64,
) -> SegHit {
    let dxab = (bx - ax).abs();
    let dzab = (bz - az).abs();
    let (pa1, pa2, pc1, pc2) = if dxab >= dzab { (ax, bx, cx, dx) } else { (az, bz, cz, dz) };

    let len_ab = pa2 - pa1;
    if within_eps(len_ab, eps) {
        // AB degenerates to a point lying on CD
        let len_cd = pc2 - pc1;
        let u = if within_eps(len_cd, eps) { 0.0 } else { (pa1 - pc1) / len_cd };
        return SegHit::Cross { t: 0.0, u, x: ax, z: az };
    }
    let t_c = (pc1 - pa1) / len_ab;
    let t_d = (pc2 - pa1) / len_ab;
    let mut lo = t_c.min(t_d);
    let mut hi = t_c.max(t_d);
    if hi < -eps || lo > 1.0 + eps {
        return SegHit::Miss;
    }
    lo = lo.max(0.0);
    hi = hi.min(1.0);
    if hi < lo {
        return SegHit::Miss;
    }
    let len_cd = pc2 - pc1;
    let u_lo = if within_eps(len_cd, eps) { 0.0 } else { (pa1 + lo * len_ab - pc1) / len_cd };
    let u_hi = if within_eps(len_cd, eps) { 0.0 } else { (pa1 + hi * len_ab - pc1) / len_cd };
    let (u0, u1) = if u_lo <= u_hi { (u_lo, u_hi) } else { (u_hi, u_lo) };
    SegHit::Collinear { t0: lo, t1: hi, u0, u1 }
}

/// Intersect segment AB with segment CD (XZ coordinates).
pub fn intersect_segments(
    ax: f32, az: f32, bx: f32, bz: f32,
    cx: f32, cz: f32, dx: f32, dz: f32,
    eps_pos: f32, eps_denom: f32,
) -> SegHit {
    let (ax, az, bx, bz) = (ax as f64, az as f64, bx as f64, bz as f64);
    let (cx, cz, dx, dz) = (cx as f64, cz as f64, dx as f64, dz as f64);
    let eps = eps_pos as f64;
    let denom_eps = eps_denom as f64;

    let o1 = orient(ax, az, bx, bz, cx, cz);
    let o2 = orient(ax, az, bx, bz, dx, dz);
    let o3 = orient(cx, cz, dx, dz, ax, az);
    let o4 = orient(cx, cz, dx, dz, bx, bz);

    if within_eps(o1, eps) && within_eps(o2, eps) && within_eps(o3, eps) && within_eps(o4, eps) {
        return collinear_span(ax, az, bx, bz, cx, cz, dx, dz, eps);
    }

    let straddle1 =
        (o1 > 0.0 && o2 < 0.0) || (o1 < 0.0 && o2 > 0.0) || within_eps(o1, eps) || within_eps(o2, eps);
    let straddle2 =
        (o3 > 0.0 && o4 < 0.0) || (o3 < 0.0 && o4 > 0.0) || within_eps(o3, eps) || within_eps(o4, eps);
    if !(straddle1 && straddle2) {
        return SegHit::Miss;
    }

    let r_x = bx - ax;
    let r_z = bz - az;
    let s_x = dx - cx;
    let s_z = dz - cz;
    let rxs = r_x * s_z - r_z * s_x;
    if within_eps(rxs, denom_eps) {
        // Parallel, non-collinear
        return SegHit::Miss;
    }
    let q_p_x = cx - ax;
    let q_p_z = cz - az;
    let t = (q_p_x * s_z - q_p_z * s_x) / rxs;
    let u = (q_p_x * r_z - q_p_z * r_x) / rxs;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        SegHit::Cross { t, u, x: ax + t * r_x, z: az + t * r_z }
    } else {
        SegHit::Miss
    }
}

/// Intersect two segments after pulling both pairs of endpoints inward
/// by `margin` along their own directions, discarding near-endpoint
/// grazes. Collinear overlaps do not count as a crossing here.
///
/// Returns the intersection point with Y interpolated along AB.
pub fn intersect_with_margin(a: Vec3, b: Vec3, c: Vec3, d: Vec3, margin: f32) -> Option<Vec3> {
    let dir_ab = (b - a).normalized();
    let dir_cd = (d - c).normalized();
    let a2 = a + dir_ab * margin;
    let b2 = b - dir_ab * margin;
    let c2 = c + dir_cd * margin;
    let d2 = d - dir_cd * margin;
    match intersect_segments(
        a2.x, a2.z, b2.x, b2.z, c2.x, c2.z, d2.x, d2.z, EPS_POS, EPS_DENOM,
    ) {
        SegHit::Cross { t, x, z, .. } => {
            let y = a2.y as f64 + t * (b2.y as f64 - a2.y as f64);
            Some(Vec3::new(x as f32, y as f32, z as f32))
        }
        _ => None,
    }
}
