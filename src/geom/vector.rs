//! Vector primitives over plain `[f64; 3]` triples.
//!
//! Every curve operation works on the position or normal part of a
//! [`CurvePoint`](super::CurvePoint) as a bare triple, so these helpers stay
//! free functions instead of methods on [`Vec3`](super::Vec3).

#[must_use]
pub fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// `a - b`.
#[must_use]
pub fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[must_use]
pub fn scale(v: [f64; 3], s: f64) -> [f64; 3] {
    [v[0] * s, v[1] * s, v[2] * s]
}

#[must_use]
pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[must_use]
pub fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[must_use]
pub fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

#[must_use]
pub fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    norm(sub(a, b))
}

/// Unit vector along `v`. A zero or non-finite vector is returned as-is.
#[must_use]
pub fn normalize(v: [f64; 3]) -> [f64; 3] {
    let len = norm(v);
    if len.is_finite() && len > 0.0 {
        scale(v, 1.0 / len)
    } else {
        v
    }
}

/// Angle between two vectors in `[0, π]`.
///
/// The cosine is clamped to `[-1, 1]` so rounding on nearly parallel inputs
/// cannot push `acos` out of its domain. Returns `0.0` when either vector has
/// zero length.
#[must_use]
pub fn angle(a: [f64; 3], b: [f64; 3]) -> f64 {
    let la = norm(a);
    let lb = norm(b);
    if la <= 0.0 || lb <= 0.0 || !la.is_finite() || !lb.is_finite() {
        return 0.0;
    }
    (dot(a, b) / (la * lb)).clamp(-1.0, 1.0).acos()
}
