//! Point reduction filters: consecutive duplicate removal and straight-line
//! simplification.
//!
//! Both filters only ever select a subset of their input. The first and last
//! point of a curve always survive, and neither filter fails: inputs that are
//! too short come back unchanged and degenerate directions are skipped, both
//! recorded in [`FilterDiagnostics`].
//!
//! # Example
//!
//! ```
//! use curve_engine::geom::{CurvePoint, DuplicateFilterOptions, filter_duplicates};
//!
//! let curve = vec![
//!     CurvePoint::xyz(0.0, 0.0, 0.0),
//!     CurvePoint::xyz(0.0, 0.0, 0.001),
//!     CurvePoint::xyz(5.0, 0.0, 0.0),
//! ];
//! let (filtered, diag) = filter_duplicates(&curve, DuplicateFilterOptions::new(0.01));
//! assert_eq!(filtered, vec![curve[0], curve[2]]);
//! assert_eq!(diag.points_removed, 1);
//! ```

use super::core::Tolerance;
use super::point::{Curve, CurvePoint};
use super::vector::{angle, distance, norm, sub};

/// Diagnostics shared by the point filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterDiagnostics {
    /// Number of input points.
    pub input_point_count: usize,
    /// Number of output points.
    pub output_point_count: usize,
    /// Number of points removed.
    pub points_removed: usize,
    /// The input was shorter than the filter's minimum and passed through.
    pub insufficient_points: bool,
    /// Comparisons skipped because two points coincide and no direction exists.
    pub degenerate_directions: usize,
}

impl FilterDiagnostics {
    fn passthrough(count: usize, insufficient: bool) -> Self {
        Self {
            input_point_count: count,
            output_point_count: count,
            insufficient_points: insufficient,
            ..Default::default()
        }
    }

    fn finish(mut self, output: usize) -> Self {
        self.output_point_count = output;
        self.points_removed = self.input_point_count - output;
        self
    }
}

/// `true` when both points carry normals and they differ by more than `tolerance`.
/// Points without a normal never break a run.
fn normals_diverge(a: &CurvePoint, b: &CurvePoint, tolerance: f64) -> bool {
    match (a.normal, b.normal) {
        (Some(na), Some(nb)) => angle(na, nb) > tolerance,
        _ => false,
    }
}

// ============================================================================
// Duplicate points
// ============================================================================

/// Options for [`filter_duplicates`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicateFilterOptions {
    /// Points within this distance of the cluster anchor are absorbed.
    /// A non-positive value disables the filter.
    pub distance: f64,
    /// Also require the normals to match before absorbing a point.
    pub compare_normals: bool,
    /// Maximum normal deviation in radians when `compare_normals` is set.
    pub angle: f64,
}

impl DuplicateFilterOptions {
    #[must_use]
    pub const fn new(distance: f64) -> Self {
        Self {
            distance,
            compare_normals: false,
            angle: 0.01,
        }
    }

    /// Compare normals too, with the given angular tolerance (radians).
    #[must_use]
    pub const fn with_normals(mut self, angle: f64) -> Self {
        self.compare_normals = true;
        self.angle = angle;
        self
    }

    #[must_use]
    pub const fn compare_normals(mut self, compare: bool) -> Self {
        self.compare_normals = compare;
        self
    }

    #[must_use]
    pub const fn with_normal_tolerance(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }
}

impl Default for DuplicateFilterOptions {
    fn default() -> Self {
        Self::new(0.002)
    }
}

/// Removes consecutive near-duplicate points.
///
/// The scan keeps a cluster anchor and skips every immediately following
/// point within `distance` of it (and, with `compare_normals`, within
/// `angle` of its normal). The first point breaking the run becomes the new
/// anchor. Distances are measured from the anchor, not the previous point,
/// and the last point is never compared against the first. When the final
/// cluster swallows the end point, the end point is kept as well.
#[must_use]
pub fn filter_duplicates(
    points: &[CurvePoint],
    options: DuplicateFilterOptions,
) -> (Curve, FilterDiagnostics) {
    if points.len() < 2 {
        return (points.to_vec(), FilterDiagnostics::passthrough(points.len(), true));
    }
    if options.distance <= 0.0 || options.distance.is_nan() {
        return (points.to_vec(), FilterDiagnostics::passthrough(points.len(), false));
    }

    let diagnostics = FilterDiagnostics {
        input_point_count: points.len(),
        ..Default::default()
    };

    let mut result = Vec::with_capacity(points.len());
    let mut absorbed_last = false;
    let mut i = 0;
    while i < points.len() {
        let anchor = &points[i];
        result.push(*anchor);

        let cluster = points[i + 1..]
            .iter()
            .take_while(|next| {
                distance(anchor.position, next.position) <= options.distance
                    && !(options.compare_normals && normals_diverge(anchor, next, options.angle))
            })
            .count();
        i += cluster + 1;
        absorbed_last = cluster > 0 && i == points.len();
    }

    // A trailing cluster absorbs the end point. Keep it alongside the
    // cluster anchor so both endpoints survive.
    if absorbed_last {
        result.extend(points.last().copied());
    }

    log::debug!(
        "filter_duplicates: {} -> {} points (tol {})",
        points.len(),
        result.len(),
        options.distance
    );
    let diagnostics = diagnostics.finish(result.len());
    (result, diagnostics)
}

// ============================================================================
// Straight lines
// ============================================================================

/// Options for [`filter_straight_lines`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightLineOptions {
    /// Maximum deviation (radians) from the anchor's initial direction.
    pub angle: f64,
    /// Also require the normals to stay within `normal_angle` of the anchor's.
    pub compare_normals: bool,
    /// Maximum normal deviation in radians when `compare_normals` is set.
    pub normal_angle: f64,
}

impl StraightLineOptions {
    #[must_use]
    pub const fn new(angle: f64) -> Self {
        Self {
            angle,
            compare_normals: true,
            normal_angle: 0.01,
        }
    }

    #[must_use]
    pub const fn compare_normals(mut self, compare: bool) -> Self {
        self.compare_normals = compare;
        self
    }

    #[must_use]
    pub const fn with_normal_angle(mut self, normal_angle: f64) -> Self {
        self.normal_angle = normal_angle;
        self
    }
}

impl Default for StraightLineOptions {
    fn default() -> Self {
        Self::new(0.02)
    }
}

/// Removes interior points of straight runs.
///
/// From anchor `A` and its neighbor `B`, the run grows over the following
/// points `J` while the angle between `A→B` and `A→J` stays within
/// `options.angle`. Both the direction and the normal are compared against
/// the fixed anchor, never against the previous point, so the effective
/// tolerance tightens as `J` moves away from `A`. Finely sampled shallow arcs
/// are therefore kept rather than flattened by accumulated drift.
///
/// The run's last point becomes the next anchor. Passes repeat until one
/// removes nothing, so filtering the result again returns it unchanged. The
/// first and last points are always kept.
#[must_use]
pub fn filter_straight_lines(
    points: &[CurvePoint],
    options: StraightLineOptions,
) -> (Curve, FilterDiagnostics) {
    if points.len() < 3 {
        return (points.to_vec(), FilterDiagnostics::passthrough(points.len(), true));
    }

    let (mut result, degenerate) = straight_line_pass(points, options);
    let mut passes = 1;
    while result.len() >= 3 {
        let (next, _) = straight_line_pass(&result, options);
        if next.len() == result.len() {
            break;
        }
        result = next;
        passes += 1;
    }

    log::debug!(
        "filter_straight_lines: {} -> {} points in {passes} passes ({degenerate} degenerate)",
        points.len(),
        result.len(),
    );
    let diagnostics = FilterDiagnostics {
        input_point_count: points.len(),
        degenerate_directions: degenerate,
        ..Default::default()
    }
    .finish(result.len());
    (result, diagnostics)
}

/// One anchor-fixed scan. Returns the kept points and the number of
/// comparisons skipped for coincident points.
fn straight_line_pass(points: &[CurvePoint], options: StraightLineOptions) -> (Curve, usize) {
    let zero = Tolerance::ZERO_LENGTH;
    let mut degenerate = 0;
    let mut result = Vec::with_capacity(points.len());

    let mut i = 0;
    while i + 1 < points.len() {
        let anchor = &points[i];
        result.push(*anchor);

        let direction = sub(points[i + 1].position, anchor.position);
        if zero.is_zero_length(norm(direction)) {
            degenerate += 1;
            i += 1;
            continue;
        }

        let mut run_end = None;
        for (j, candidate) in points.iter().enumerate().skip(i + 2) {
            let to_candidate = sub(candidate.position, anchor.position);
            if zero.is_zero_length(norm(to_candidate)) {
                degenerate += 1;
            } else if angle(direction, to_candidate) > options.angle {
                break;
            }
            if options.compare_normals && normals_diverge(anchor, candidate, options.normal_angle) {
                break;
            }
            run_end = Some(j);
        }

        i = run_end.unwrap_or(i + 1);
    }
    result.extend(points.last().copied());
    (result, degenerate)
}
