//! Raster pattern generation in local 2D coordinates.
//!
//! Rows run along Y at increasing X and alternate direction (boustrophedon).
//! Every point carries the normal −Z, so the grid can be transformed into a
//! reference frame above a part and projected downwards onto it.

use super::core::Tolerance;
use super::point::{CurvePoint, CurveSet};

/// Normal carried by every generated point.
pub const GRID_NORMAL: [f64; 3] = [0.0, 0.0, -1.0];

/// Errors raised by [`generate_grid`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("grid steps must be finite and positive, got ({step_x}, {step_y})")]
    InvalidStep { step_x: f64, step_y: f64 },

    #[error("grid size must be finite and non-negative, got ({size_x}, {size_y})")]
    InvalidSize { size_x: f64, size_y: f64 },

    #[error("grid would hold about {points} points, the limit is {}", MAX_GRID_POINTS)]
    TooLarge { points: f64 },
}

/// Upper bound on the number of points [`generate_grid`] will produce.
pub const MAX_GRID_POINTS: usize = 1 << 24;

/// Options for [`generate_grid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOptions {
    /// Add a final row exactly at `size_x` when `step_x` does not land on it.
    pub cover_all: bool,
    /// Shrink `step_x` so it divides `size_x` evenly.
    pub even_distribution: bool,
    /// Merge all rows into one zig-zag curve.
    pub continuous: bool,
    /// Taper the Y range towards the center as X grows (degrees, clamped to
    /// `[0, 90]`). Zero keeps a rectangle.
    pub triangle_angle_deg: f64,
}

impl GridOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cover_all: false,
            even_distribution: false,
            continuous: false,
            triangle_angle_deg: 0.0,
        }
    }

    #[must_use]
    pub const fn cover_all(mut self, cover_all: bool) -> Self {
        self.cover_all = cover_all;
        self
    }

    #[must_use]
    pub const fn even_distribution(mut self, even: bool) -> Self {
        self.even_distribution = even;
        self
    }

    #[must_use]
    pub const fn continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    #[must_use]
    pub const fn with_triangle_angle(mut self, degrees: f64) -> Self {
        self.triangle_angle_deg = degrees;
        self
    }
}

impl Default for GridOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a raster of rows covering `size_x` × `size_y`.
///
/// Row `k` sits at `x = k · step_x` while `x ≤ size_x`. Within a row, points
/// are spaced `step_y` apart from the row's start boundary, and a final point
/// is added on the far boundary when the step does not land on it. Rows
/// alternate scan direction. With a triangle angle `a`, the X extent is
/// limited to `(size_y / 2) / tan(a)` and a row at `x` spans
/// `[x·tan(a), size_y − x·tan(a)]`.
///
/// # Errors
/// [`GridError::InvalidStep`] for non-positive or non-finite steps and
/// [`GridError::InvalidSize`] for negative or non-finite sizes.
pub fn generate_grid(
    size_x: f64,
    size_y: f64,
    step_x: f64,
    step_y: f64,
    options: GridOptions,
) -> Result<CurveSet, GridError> {
    if !(step_x.is_finite() && step_y.is_finite() && step_x > 0.0 && step_y > 0.0) {
        return Err(GridError::InvalidStep { step_x, step_y });
    }
    if !(size_x.is_finite() && size_y.is_finite() && size_x >= 0.0 && size_y >= 0.0) {
        return Err(GridError::InvalidSize { size_x, size_y });
    }

    let tol = Tolerance::DEFAULT;
    let eps_x = tol.relative_to(size_x);
    let eps_y = tol.relative_to(size_y);

    let angle = options.triangle_angle_deg.clamp(0.0, 90.0).to_radians();
    let taper = if angle > 0.0 { angle.tan() } else { 0.0 };
    let size_x = if taper > 0.0 {
        size_x.min(size_y * 0.5 / taper)
    } else {
        size_x
    };

    let mut step_x = step_x;
    if options.even_distribution {
        let intervals = size_x / step_x;
        if (intervals - intervals.round()).abs() > tol.relative_to(intervals) {
            step_x = size_x / (intervals.floor() + 1.0);
        }
    }

    let points = ((size_x / step_x).floor() + 2.0) * ((size_y / step_y).floor() + 2.0);
    if points > MAX_GRID_POINTS as f64 {
        return Err(GridError::TooLarge { points });
    }

    let mut columns: Vec<f64> = Vec::new();
    let mut k = 0usize;
    loop {
        let x = k as f64 * step_x;
        if x > size_x + eps_x {
            break;
        }
        columns.push(x.min(size_x));
        k += 1;
    }
    if options.cover_all && columns.last().is_some_and(|&x| size_x - x > eps_x) {
        columns.push(size_x);
    }

    let mut rows: CurveSet = Vec::with_capacity(columns.len());
    let mut forward = true;
    for x in columns {
        let lo = x * taper;
        let hi = size_y - x * taper;
        if lo > hi + eps_y {
            continue;
        }
        let ys = row_positions(lo, hi.max(lo), step_y, eps_y, forward);
        rows.push(ys.into_iter().map(|y| CurvePoint::with_normal([x, y, 0.0], GRID_NORMAL)).collect());
        forward = !forward;
    }

    log::debug!(
        "generate_grid: {size_x}x{size_y} step ({step_x}, {step_y}) -> {} rows",
        rows.len()
    );

    if options.continuous {
        Ok(vec![rows.into_iter().flatten().collect()])
    } else {
        Ok(rows)
    }
}

/// Y positions of one row from `lo` to `hi` (or back), ending on the far
/// boundary.
fn row_positions(lo: f64, hi: f64, step: f64, eps: f64, forward: bool) -> Vec<f64> {
    let span = hi - lo;
    let mut ys = Vec::new();
    let mut j = 0usize;
    loop {
        let offset = j as f64 * step;
        if offset > span + eps {
            break;
        }
        ys.push(if forward { lo + offset } else { hi - offset });
        j += 1;
    }

    let (far, last) = if forward {
        (hi, ys.last().copied())
    } else {
        (lo, ys.last().copied())
    };
    match last {
        Some(y) if (y - far).abs() <= eps => {
            if let Some(y) = ys.last_mut() {
                *y = far;
            }
        }
        _ => ys.push(far),
    }
    ys
}
