// Centralized tolerances and helpers for robust geometry

pub const EPS_POS: f32 = 1e-4;        // point coincidence threshold
pub const EPS_LEN: f32 = 1e-6;        // zero-length vector threshold
pub const EPS_DENOM: f32 = 1e-8;      // denominator guard for ratios
pub const EPS_PARALLEL: f32 = 1e-5;   // unit-dot slack for (anti)parallel tests

#[inline] pub fn clamp(x: f32, lo: f32, hi: f32) -> f32 { x.max(lo).min(hi) }
#[inline] pub fn approx_eq(a: f32, b: f32, eps: f32) -> bool { (a - b).abs() <= eps }
