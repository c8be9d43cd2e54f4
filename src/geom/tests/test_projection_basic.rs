use crate::geom::{
    Curve, CurvePoint, GridProjectionOptions, Point3, ProjectionError, ProjectionKind,
    ProjectionMode, SurfaceOracle, Transform, Vec3, project, project_grid,
};
use crate::oracle::{ArrayOracle, PlaneOracle};

fn on_plane() -> Curve {
    (0..5)
        .map(|i| CurvePoint::with_normal([f64::from(i), 0.5 * f64::from(i), 2.0], [0.0, 0.0, 1.0]))
        .collect()
}

/// Surface at z = 0 for x < 2 and z = -10 beyond.
struct Ledge;

impl SurfaceOracle for Ledge {
    fn project_points(&self, points: &[CurvePoint], _kind: ProjectionKind) -> Result<Curve, ProjectionError> {
        Ok(points
            .iter()
            .map(|p| {
                let z = if p.position[0] < 2.0 { 0.0 } else { -10.0 };
                CurvePoint::with_normal([p.position[0], p.position[1], z], [0.0, 0.0, 1.0])
            })
            .collect())
    }
}

#[test]
fn curve_on_surface_is_unchanged_along_normal() {
    let plane = PlaneOracle::horizontal(2.0);
    let curve = on_plane();
    for recompute in [false, true] {
        let out = project(&curve, &plane, ProjectionMode::OnSurfaceAlongNormal, recompute).unwrap();
        assert_eq!(out, curve);
    }
}

#[test]
fn recalculate_mode_keeps_positions() {
    let tilted = PlaneOracle::new([0.0, 0.0, 0.0], [0.0, 1.0, 1.0]).unwrap();
    let curve = on_plane();
    let out = project(&curve, &tilted, ProjectionMode::RecalculateNormal { along_normal: false }, true).unwrap();
    let expected = Vec3::new(0.0, 1.0, 1.0).normalized().unwrap().to_array();
    for (before, after) in curve.iter().zip(&out) {
        assert_eq!(after.position, before.position);
        assert_eq!(after.normal, Some(expected));
    }
}

#[test]
fn unsupported_kind_is_reported() {
    let closest_only = ArrayOracle::new(|points: &[Vec<f64>], _: ProjectionKind| Ok(points.to_vec()))
        .supporting(&[ProjectionKind::Closest]);
    let err = project(&on_plane(), &closest_only, ProjectionMode::OnSurfaceAlongNormal, true).unwrap_err();
    assert_eq!(
        err,
        ProjectionError::OracleUnavailable {
            kind: ProjectionKind::AlongNormalRecalc
        }
    );
    assert!(project(&on_plane(), &closest_only, ProjectionMode::OnSurfaceClosest, false).is_ok());
}

#[test]
fn empty_input_skips_the_oracle() {
    let failing = ArrayOracle::new(|_: &[Vec<f64>], _: ProjectionKind| Err("host offline".to_string()));
    assert_eq!(project(&[], &failing, ProjectionMode::OnSurfaceClosest, false).unwrap(), Vec::new());
    assert_eq!(
        project(&on_plane(), &failing, ProjectionMode::OnSurfaceClosest, false).unwrap_err(),
        ProjectionError::Oracle("host offline".to_string())
    );
}

#[test]
fn grid_line_splits_at_a_drop() {
    let line: Curve = (0..5)
        .map(|i| CurvePoint::with_normal([f64::from(i), 0.0, 5.0], [0.0, 0.0, -1.0]))
        .collect();
    let (runs, diag) = project_grid(&[line], Transform::identity(), &Ledge, GridProjectionOptions::new()).unwrap();

    // The drop at x = 2 is a 10-unit jump for a 1-unit step; every later
    // point is compared against x = 1 and rejected too.
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].len(), 2);
    assert_eq!(diag.rejected_points, 3);
    assert!(runs[0].iter().all(|p| p.position[2] == 0.0));
}

#[test]
fn short_runs_are_dropped() {
    let line: Curve = (0..5)
        .map(|i| CurvePoint::with_normal([f64::from(i), 0.0, 5.0], [0.0, 0.0, -1.0]))
        .collect();
    let options = GridProjectionOptions::new().with_min_points(3);
    let (runs, diag) = project_grid(&[line], Transform::identity(), &Ledge, options).unwrap();
    assert!(runs.is_empty());
    assert_eq!(diag.dropped_runs, 1);
}

#[test]
fn singular_frame_is_rejected() {
    let flat = Transform::from_axes(Point3::ORIGIN, Vec3::X, Vec3::X, Vec3::Z);
    let err = project_grid(&[on_plane()], flat, &PlaneOracle::horizontal(0.0), GridProjectionOptions::new()).unwrap_err();
    assert_eq!(err, ProjectionError::SingularFrame);
}
