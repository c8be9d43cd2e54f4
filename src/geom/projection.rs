//! Surface projection: mapping curve points onto a caller-supplied surface.
//!
//! The engine never owns surface data. A [`SurfaceOracle`] answers batched
//! projection queries, and this module layers modes, normal recalculation
//! and the grid clean-up heuristics on top of it.
//!
//! # Operations
//! - [`project`]: project a curve with one of the [`ProjectionMode`]s.
//! - [`project_grid`]: project generated raster lines, rejecting points that
//!   fall through holes or climb walls, and smoothing normals per run.
//! - [`offset_curve`]: shift a curve along its normals.

use super::core::{Tolerance, Transform};
use super::point::{Curve, CurvePoint, CurveSet, PointFormatError, transform_curve};
use super::vector::{add, distance, normalize, scale};

// ============================================================================
// Oracle
// ============================================================================

/// The primitive projection queries a surface can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionKind {
    /// Move along the point's normal until it meets the surface.
    AlongNormal,
    /// As [`ProjectionKind::AlongNormal`], returning the surface normal at the landing point.
    AlongNormalRecalc,
    /// Move to the closest surface point.
    Closest,
    /// As [`ProjectionKind::Closest`], returning the surface normal at the landing point.
    ClosestRecalc,
}

impl ProjectionKind {
    #[must_use]
    pub const fn along_normal(self) -> bool {
        matches!(self, Self::AlongNormal | Self::AlongNormalRecalc)
    }

    #[must_use]
    pub const fn recalculates_normal(self) -> bool {
        matches!(self, Self::AlongNormalRecalc | Self::ClosestRecalc)
    }

    #[must_use]
    pub const fn new(along_normal: bool, recalculate_normal: bool) -> Self {
        match (along_normal, recalculate_normal) {
            (true, false) => Self::AlongNormal,
            (true, true) => Self::AlongNormalRecalc,
            (false, false) => Self::Closest,
            (false, true) => Self::ClosestRecalc,
        }
    }
}

/// Errors raised by projection operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("surface oracle cannot service {kind:?} projections")]
    OracleUnavailable { kind: ProjectionKind },

    #[error("surface oracle returned {actual} points for a batch of {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("surface oracle returned an invalid point: {0}")]
    InvalidPoint(#[from] PointFormatError),

    #[error("projection frame is singular")]
    SingularFrame,

    #[error("surface oracle failed: {0}")]
    Oracle(String),
}

/// A surface that can project batches of points.
///
/// Implementations must return exactly one point per input point, in order.
/// A point that cannot be projected comes back unchanged. Returned points
/// carry a normal when `kind` recalculates normals.
pub trait SurfaceOracle {
    /// Whether this oracle can service `kind`. Defaults to all kinds.
    fn supports(&self, _kind: ProjectionKind) -> bool {
        true
    }

    /// Project `points` onto the surface.
    ///
    /// # Errors
    /// Implementation specific. The error is propagated unchanged.
    fn project_points(&self, points: &[CurvePoint], kind: ProjectionKind) -> Result<Curve, ProjectionError>;
}

impl<T: SurfaceOracle + ?Sized> SurfaceOracle for &T {
    fn supports(&self, kind: ProjectionKind) -> bool {
        (**self).supports(kind)
    }

    fn project_points(&self, points: &[CurvePoint], kind: ProjectionKind) -> Result<Curve, ProjectionError> {
        (**self).project_points(points, kind)
    }
}

/// Checked oracle call: capability first, then the batch length contract.
fn query<O: SurfaceOracle + ?Sized>(
    oracle: &O,
    points: &[CurvePoint],
    kind: ProjectionKind,
) -> Result<Curve, ProjectionError> {
    if !oracle.supports(kind) {
        return Err(ProjectionError::OracleUnavailable { kind });
    }
    if points.is_empty() {
        return Ok(Vec::new());
    }

    let projected = oracle.project_points(points, kind).inspect_err(|err| {
        log::warn!("surface oracle failed on {} points: {err}", points.len());
    })?;
    if projected.len() != points.len() {
        return Err(ProjectionError::LengthMismatch {
            expected: points.len(),
            actual: projected.len(),
        });
    }
    Ok(projected)
}

// ============================================================================
// Project
// ============================================================================

/// How [`project`] moves points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    /// Move each point along its own normal onto the surface.
    OnSurfaceAlongNormal,
    /// Move each point to the nearest surface point.
    OnSurfaceClosest,
    /// Keep positions and only replace normals with the surface normal,
    /// found along the point normal or at the closest surface point.
    RecalculateNormal { along_normal: bool },
}

impl ProjectionMode {
    /// Map the three tool flags onto a mode. Returns `None` when the flags
    /// request no projection at all.
    #[must_use]
    pub const fn from_flags(on_surface: bool, along_normal: bool, recalculate_normals: bool) -> Option<Self> {
        match (on_surface, along_normal, recalculate_normals) {
            (true, true, _) => Some(Self::OnSurfaceAlongNormal),
            (true, false, _) => Some(Self::OnSurfaceClosest),
            (false, along_normal, true) => Some(Self::RecalculateNormal { along_normal }),
            (false, _, false) => None,
        }
    }

    /// The oracle query issued for this mode.
    #[must_use]
    pub const fn kind(self, recompute_normals: bool) -> ProjectionKind {
        match self {
            Self::OnSurfaceAlongNormal => ProjectionKind::new(true, recompute_normals),
            Self::OnSurfaceClosest => ProjectionKind::new(false, recompute_normals),
            Self::RecalculateNormal { along_normal } => ProjectionKind::new(along_normal, true),
        }
    }
}

/// Project a curve onto the oracle's surface.
///
/// With [`ProjectionMode::RecalculateNormal`] the oracle is queried once and
/// every original position is restored afterwards, so only the normals
/// change. `recompute_normals` is implied in that mode.
///
/// # Errors
/// - [`ProjectionError::OracleUnavailable`] if the oracle does not support
///   the query. No fallback mode is tried.
/// - [`ProjectionError::LengthMismatch`] if the oracle breaks the batch contract.
/// - Any error returned by the oracle itself.
pub fn project<O: SurfaceOracle + ?Sized>(
    points: &[CurvePoint],
    oracle: &O,
    mode: ProjectionMode,
    recompute_normals: bool,
) -> Result<Curve, ProjectionError> {
    let kind = mode.kind(recompute_normals);
    let mut projected = query(oracle, points, kind)?;

    if let ProjectionMode::RecalculateNormal { .. } = mode {
        for (out, original) in projected.iter_mut().zip(points) {
            out.position = original.position;
        }
    }

    log::debug!("project: {} points via {kind:?}", points.len());
    Ok(projected)
}

// ============================================================================
// Project grid
// ============================================================================

/// Options for [`project_grid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridProjectionOptions {
    /// Drop points whose projection did not move them (no surface hit).
    pub remove_unprojected: bool,
    /// A point is rejected when its projected step exceeds this multiple of
    /// its source step.
    pub jump_ratio: f64,
    /// Runs shorter than this are discarded.
    pub min_points: usize,
    /// Replace each run's normals with their filtered mean.
    pub smooth_normals: bool,
}

impl GridProjectionOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            remove_unprojected: false,
            jump_ratio: std::f64::consts::SQRT_2,
            min_points: 2,
            smooth_normals: true,
        }
    }

    #[must_use]
    pub const fn remove_unprojected(mut self, remove: bool) -> Self {
        self.remove_unprojected = remove;
        self
    }

    #[must_use]
    pub const fn with_jump_ratio(mut self, ratio: f64) -> Self {
        self.jump_ratio = ratio;
        self
    }

    #[must_use]
    pub const fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    #[must_use]
    pub const fn smooth_normals(mut self, smooth: bool) -> Self {
        self.smooth_normals = smooth;
        self
    }
}

impl Default for GridProjectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Diagnostics for [`project_grid`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridProjectionDiagnostics {
    pub input_line_count: usize,
    pub input_point_count: usize,
    pub output_run_count: usize,
    pub output_point_count: usize,
    /// Points dropped because the projection did not reach the surface.
    pub unprojected_points: usize,
    /// Points dropped by the jump check.
    pub rejected_points: usize,
    /// Runs dropped for having fewer than `min_points` points.
    pub dropped_runs: usize,
}

/// Project raster lines onto a surface and clean up the result.
///
/// `lines` are expressed in `frame`, which is itself expressed in the
/// oracle's coordinate system. All lines are projected along their normals in
/// a single oracle batch, then brought back into `frame` coordinates.
///
/// Each line is then walked in order. A point is rejected when
/// `|proj − proj_last| > jump_ratio · |src − src_last|`, where `_last` is the
/// last accepted point: this catches points that fell through a window or
/// climbed a wall. A rejected (or, with `remove_unprojected`, unprojected)
/// point splits the line. Every resulting run gets smoothed normals, and runs
/// with fewer than `min_points` points are dropped.
///
/// # Errors
/// [`ProjectionError::SingularFrame`] if `frame` cannot be inverted, plus the
/// oracle errors of [`project`].
pub fn project_grid<O: SurfaceOracle + ?Sized>(
    lines: &[Curve],
    frame: Transform,
    oracle: &O,
    options: GridProjectionOptions,
) -> Result<(CurveSet, GridProjectionDiagnostics), ProjectionError> {
    let to_local = frame.inverse().ok_or(ProjectionError::SingularFrame)?;

    let batch: Curve = lines.iter().flat_map(|line| transform_curve(line, frame)).collect();
    let projected = query(oracle, &batch, ProjectionKind::AlongNormalRecalc)?;

    let mut diagnostics = GridProjectionDiagnostics {
        input_line_count: lines.len(),
        input_point_count: batch.len(),
        ..Default::default()
    };

    let mut runs = Vec::new();
    let mut offset = 0;
    for line in lines {
        let landed = &projected[offset..offset + line.len()];
        offset += line.len();

        for mut run in split_line(line, landed, to_local, options, &mut diagnostics) {
            if run.len() < options.min_points.max(1) {
                diagnostics.dropped_runs += 1;
                continue;
            }
            if options.smooth_normals {
                smooth_normals(&mut run);
            }
            runs.push(run);
        }
    }

    diagnostics.output_run_count = runs.len();
    diagnostics.output_point_count = runs.iter().map(Vec::len).sum();
    log::debug!(
        "project_grid: {} lines -> {} runs ({} rejected, {} unprojected, {} short runs)",
        diagnostics.input_line_count,
        diagnostics.output_run_count,
        diagnostics.rejected_points,
        diagnostics.unprojected_points,
        diagnostics.dropped_runs
    );
    Ok((runs, diagnostics))
}

/// Walk one projected line and cut it into runs of accepted points.
fn split_line(
    line: &[CurvePoint],
    landed: &[CurvePoint],
    to_local: Transform,
    options: GridProjectionOptions,
    diagnostics: &mut GridProjectionDiagnostics,
) -> Vec<Curve> {
    let miss = Tolerance::PROJECTION_MISS;
    let mut runs = Vec::new();
    let mut current: Curve = Vec::new();
    let mut last: Option<([f64; 3], [f64; 3])> = None;

    for (source, hit) in line.iter().zip(landed) {
        let mut proj = hit.transformed(to_local);
        if proj.normal.is_none() {
            proj.normal = source.normal;
        }

        if options.remove_unprojected && distance(source.position, proj.position) < miss.eps {
            diagnostics.unprojected_points += 1;
            runs.push(std::mem::take(&mut current));
            continue;
        }

        if let Some((src_last, proj_last)) = last {
            let step = distance(source.position, src_last);
            let jump = distance(proj.position, proj_last);
            if jump > options.jump_ratio * step {
                log::trace!("project_grid: rejected point {:?} (jump {jump:.4} > step {step:.4})", source.position);
                diagnostics.rejected_points += 1;
                runs.push(std::mem::take(&mut current));
                continue;
            }
        }

        last = Some((source.position, proj.position));
        current.push(proj);
    }
    runs.push(current);

    runs.retain(|run| !run.is_empty());
    runs
}

/// Replace every normal of a run with the run's filtered mean normal.
///
/// Per component, the mean and population standard deviation are computed.
/// If they vary at all, only normals within one standard deviation of the
/// mean on every component are averaged. The result is normalized. Points
/// without a normal are ignored for the statistics but still receive the
/// mean.
pub fn smooth_normals(run: &mut [CurvePoint]) {
    let normals: Vec<[f64; 3]> = run.iter().filter_map(|p| p.normal).collect();
    let Some(mut mean) = mean_of(&normals) else {
        return;
    };

    let n = normals.len() as f64;
    let mut std = [0.0; 3];
    for (axis, s) in std.iter_mut().enumerate() {
        let variance = normals.iter().map(|v| (v[axis] - mean[axis]).powi(2)).sum::<f64>() / n;
        *s = variance.sqrt();
    }

    if std.iter().sum::<f64>() > SLACK {
        let inliers: Vec<[f64; 3]> = normals
            .iter()
            .copied()
            .filter(|v| (0..3).all(|axis| (v[axis] - mean[axis]).abs() <= std[axis] + SLACK))
            .collect();
        if let Some(filtered) = mean_of(&inliers) {
            mean = filtered;
        }
    }

    let mean = normalize(mean);
    for point in run.iter_mut() {
        point.normal = Some(mean);
    }
}

/// Slack on the normal statistics so a normal sitting on the band edge is not
/// lost to rounding.
const SLACK: f64 = 1e-8;

fn mean_of(vectors: &[[f64; 3]]) -> Option<[f64; 3]> {
    if vectors.is_empty() {
        return None;
    }
    let sum = vectors.iter().fold([0.0; 3], |acc, v| add(acc, *v));
    Some(scale(sum, 1.0 / vectors.len() as f64))
}

/// Shift every point along its normal by `distance`. Points without a normal
/// are kept as they are.
#[must_use]
pub fn offset_curve(curve: &[CurvePoint], distance: f64) -> Curve {
    curve
        .iter()
        .map(|p| match p.normal {
            Some(n) => CurvePoint {
                position: add(p.position, scale(n, distance)),
                normal: p.normal,
            },
            None => *p,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Oracle that drops every point onto z = 0 with an upward normal.
    struct Floor;

    impl SurfaceOracle for Floor {
        fn supports(&self, kind: ProjectionKind) -> bool {
            kind != ProjectionKind::Closest
        }

        fn project_points(&self, points: &[CurvePoint], kind: ProjectionKind) -> Result<Curve, ProjectionError> {
            Ok(points
                .iter()
                .map(|p| CurvePoint {
                    position: [p.position[0], p.position[1], 0.0],
                    normal: if kind.recalculates_normal() {
                        Some([0.0, 0.0, 1.0])
                    } else {
                        p.normal
                    },
                })
                .collect())
        }
    }

    struct Truncating;

    impl SurfaceOracle for Truncating {
        fn project_points(&self, points: &[CurvePoint], _kind: ProjectionKind) -> Result<Curve, ProjectionError> {
            Ok(points[1..].to_vec())
        }
    }

    #[test]
    fn from_flags_matches_tool_mapping() {
        assert_eq!(ProjectionMode::from_flags(true, true, false), Some(ProjectionMode::OnSurfaceAlongNormal));
        assert_eq!(ProjectionMode::from_flags(true, false, true), Some(ProjectionMode::OnSurfaceClosest));
        assert_eq!(
            ProjectionMode::from_flags(false, true, true),
            Some(ProjectionMode::RecalculateNormal { along_normal: true })
        );
        assert_eq!(ProjectionMode::from_flags(false, true, false), None);
        assert_eq!(
            ProjectionMode::OnSurfaceClosest.kind(true),
            ProjectionKind::ClosestRecalc
        );
    }

    #[test]
    fn recalculate_normal_keeps_positions() {
        let curve = vec![CurvePoint::with_normal([1.0, 2.0, 3.0], [0.0, 0.0, -1.0])];
        let out = project(&curve, &Floor, ProjectionMode::RecalculateNormal { along_normal: true }, false).unwrap();
        assert_eq!(out[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(out[0].normal, Some([0.0, 0.0, 1.0]));
    }

    #[test]
    fn unsupported_kind_is_an_error() {
        let curve = vec![CurvePoint::xyz(0.0, 0.0, 1.0)];
        let err = project(&curve, &Floor, ProjectionMode::OnSurfaceClosest, false).unwrap_err();
        assert_eq!(err, ProjectionError::OracleUnavailable { kind: ProjectionKind::Closest });
    }

    #[test]
    fn length_mismatch_is_reported() {
        let curve = vec![CurvePoint::xyz(0.0, 0.0, 1.0), CurvePoint::xyz(1.0, 0.0, 1.0)];
        let err = project(&curve, &Truncating, ProjectionMode::OnSurfaceAlongNormal, true).unwrap_err();
        assert_eq!(err, ProjectionError::LengthMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn smooth_normals_discards_outlier() {
        let mut run = vec![
            CurvePoint::with_normal([0.0; 3], [0.0, 0.0, 1.0]),
            CurvePoint::with_normal([1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            CurvePoint::with_normal([2.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            CurvePoint::with_normal([3.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
        ];
        smooth_normals(&mut run);
        for p in &run {
            let n = p.normal.unwrap();
            assert!((n[2] - 1.0).abs() < 1e-12, "{n:?}");
        }
    }

    #[test]
    fn offset_moves_along_normal() {
        let curve = vec![
            CurvePoint::with_normal([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            CurvePoint::xyz(1.0, 0.0, 0.0),
        ];
        let out = offset_curve(&curve, 2.0);
        assert_eq!(out[0].position, [0.0, 0.0, 2.0]);
        assert_eq!(out[1], curve[1]);
    }
}
