use crate::geom::{
    Curve, CurvePoint, CurveSet, Point3, ProjectionMode, SurfaceOracle, Transform, Vec3,
    curve_from_arrays, filter_duplicates, filter_straight_lines, merge_curves,
    nearest_curve_point, project, rotate_start, sort_segments, split_discontinuous,
};

use super::{CurveSettings, ToolError};

/// Normal assumed for points without one when building targets.
const TARGET_DEFAULT_NORMAL: [f64; 3] = [0.0, 0.0, 1.0];

/// Convert host curves given as flat point arrays.
///
/// # Errors
/// [`ToolError::Point`] for the first point whose arity is neither 3 nor 6.
pub fn curves_from_arrays<C: AsRef<[P]>, P: AsRef<[f64]>>(curves: &[C]) -> Result<CurveSet, ToolError> {
    curves
        .iter()
        .map(|curve| curve_from_arrays(curve.as_ref()).map_err(ToolError::from))
        .collect()
}

/// Sort, merge and filter a curve set according to `settings`.
///
/// Steps run in order, each only when enabled: sort segments (optionally
/// reversing them), merge everything into one curve, remove duplicate
/// points, remove points along straight lines.
#[must_use]
pub fn simplify_curves(curves: &[Curve], settings: &CurveSettings) -> CurveSet {
    if curves.is_empty() {
        return Vec::new();
    }

    let input_points: usize = curves.iter().map(Vec::len).sum();
    let mut set = if settings.sort {
        sort_segments(curves, None, settings.reverse)
    } else {
        curves.to_vec()
    };

    if settings.merge {
        set = vec![merge_curves(&set)];
    }

    if settings.remove_duplicates {
        let options = settings.duplicate_options();
        set = set.iter().map(|curve| filter_duplicates(curve, options).0).collect();
    }

    if settings.remove_straight_lines {
        let options = settings.straight_line_options();
        set = set.iter().map(|curve| filter_straight_lines(curve, options).0).collect();
    }

    log::debug!(
        "simplify_curves: {} curves / {input_points} points -> {} curves / {} points",
        curves.len(),
        set.len(),
        set.iter().map(Vec::len).sum::<usize>()
    );
    set
}

/// Optionally project the curves (per the `project_points`,
/// `project_along_normal` and `recalculate_normals` flags), then simplify.
///
/// # Errors
/// Propagates projection errors.
pub fn simplify_on_surface<O: SurfaceOracle + ?Sized>(
    curves: &[Curve],
    oracle: &O,
    settings: &CurveSettings,
) -> Result<CurveSet, ToolError> {
    let mode = ProjectionMode::from_flags(
        settings.project_points,
        settings.project_along_normal,
        settings.recalculate_normals,
    );
    let prepared = match mode {
        Some(mode) => project_each(curves, oracle, mode, settings.recalculate_normals)?,
        None => curves.to_vec(),
    };
    Ok(simplify_curves(&prepared, settings))
}

/// Move curve points onto the surface, keeping their normals.
///
/// # Errors
/// Propagates projection errors.
pub fn project_curves<O: SurfaceOracle + ?Sized>(
    curves: &[Curve],
    oracle: &O,
    settings: &CurveSettings,
) -> Result<CurveSet, ToolError> {
    let mode = if settings.project_along_normal {
        ProjectionMode::OnSurfaceAlongNormal
    } else {
        ProjectionMode::OnSurfaceClosest
    };
    project_each(curves, oracle, mode, false)
}

/// Replace curve normals with the surface normal, keeping positions.
///
/// # Errors
/// Propagates projection errors.
pub fn recalculate_normals<O: SurfaceOracle + ?Sized>(
    curves: &[Curve],
    oracle: &O,
    settings: &CurveSettings,
) -> Result<CurveSet, ToolError> {
    let mode = ProjectionMode::RecalculateNormal {
        along_normal: settings.project_along_normal,
    };
    project_each(curves, oracle, mode, true)
}

/// One oracle batch per curve.
fn project_each<O: SurfaceOracle + ?Sized>(
    curves: &[Curve],
    oracle: &O,
    mode: ProjectionMode,
    recompute_normals: bool,
) -> Result<CurveSet, ToolError> {
    curves
        .iter()
        .map(|curve| project(curve, oracle, mode, recompute_normals).map_err(ToolError::from))
        .collect()
}

/// Reorder curves into one continuous travel order without reversing or
/// merging them. Sets of two or fewer curves are returned as they are.
#[must_use]
pub fn reorder_curves(curves: &[Curve]) -> CurveSet {
    if curves.len() <= 2 {
        return curves.to_vec();
    }
    sort_segments(curves, None, false)
}

/// Group curves into continuous sets using the split tolerance.
#[must_use]
pub fn split_curves(curves: &[Curve], settings: &CurveSettings) -> Vec<CurveSet> {
    split_discontinuous(curves, settings.split_tolerance, None)
}

/// Make the curve point nearest to `pick` the start of its curve.
///
/// Only the curve holding that point changes; it is rotated so the points
/// before the new start move to its end.
#[must_use]
pub fn move_start_point(curves: &[Curve], pick: [f64; 3]) -> CurveSet {
    let mut result = curves.to_vec();
    if let Some((curve_index, point_index)) = nearest_curve_point(curves, pick) {
        result[curve_index] = rotate_start(&curves[curve_index], point_index);
        log::debug!("move_start_point: curve {curve_index} now starts at point {point_index}");
    }
    result
}

/// Target poses for the points of a curve.
///
/// Each pose sits on the point with its Z axis along the point normal
/// (+Z when unknown), flipped when `invert_normal` is set. Points with a
/// zero normal have no defined orientation and are skipped.
#[must_use]
pub fn curve_to_targets(curve: &[CurvePoint], invert_normal: bool) -> Vec<Transform> {
    curve
        .iter()
        .filter_map(|point| {
            let mut z = Vec3::from_array(point.normal_or(TARGET_DEFAULT_NORMAL));
            if invert_normal {
                z = -z;
            }
            let pose = Transform::from_z_axis(Point3::from_array(point.position), z);
            if pose.is_none() {
                log::warn!("curve_to_targets: skipping point {:?} with zero normal", point.position);
            }
            pose
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::PlaneOracle;

    fn seg(a: [f64; 3], b: [f64; 3]) -> Curve {
        vec![CurvePoint::new(a), CurvePoint::new(b)]
    }

    #[test]
    fn simplify_sorts_merges_and_filters() {
        let curves = vec![
            seg([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
            seg([3.0, 0.0, 0.0], [2.0, 0.0, 0.0]),
            seg([1.0, 0.0, 0.0], [2.0, 0.0, 0.0]),
        ];
        let out = simplify_curves(&curves, &CurveSettings::default());
        assert_eq!(out, vec![seg([0.0, 0.0, 0.0], [3.0, 0.0, 0.0])]);
    }

    #[test]
    fn simplify_without_steps_is_identity() {
        let settings = CurveSettings {
            sort: false,
            merge: false,
            remove_duplicates: false,
            remove_straight_lines: false,
            ..CurveSettings::default()
        };
        let curves = vec![seg([0.0; 3], [1.0, 0.0, 0.0]), seg([5.0; 3], [6.0; 3])];
        assert_eq!(simplify_curves(&curves, &settings), curves);
    }

    #[test]
    fn reorder_keeps_direction() {
        let curves = vec![
            seg([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
            seg([5.0, 0.0, 0.0], [2.0, 0.0, 0.0]),
            seg([2.0, 1.0, 0.0], [3.0, 0.0, 0.0]),
        ];
        let out = reorder_curves(&curves);
        assert_eq!(out, vec![curves[0].clone(), curves[2].clone(), curves[1].clone()]);
        assert_eq!(reorder_curves(&curves[1..]), curves[1..].to_vec());
    }

    #[test]
    fn recalculate_keeps_positions() {
        let plane = PlaneOracle::horizontal(0.0);
        let curves = vec![seg([0.0, 0.0, 3.0], [1.0, 0.0, 3.0])];
        let out = recalculate_normals(&curves, &plane, &CurveSettings::default()).unwrap();
        assert_eq!(out[0][0].position, [0.0, 0.0, 3.0]);
        assert_eq!(out[0][0].normal, Some([0.0, 0.0, 1.0]));

        let projected = project_curves(&curves, &plane, &CurveSettings::default()).unwrap();
        assert_eq!(projected[0][1].position, [1.0, 0.0, 0.0]);
        assert!(projected[0][1].normal.is_none());
    }

    #[test]
    fn move_start_rotates_only_the_picked_curve() {
        let square: Curve = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
            .iter()
            .map(|p| CurvePoint::xyz(p[0], p[1], 0.0))
            .collect();
        let other = seg([10.0, 0.0, 0.0], [11.0, 0.0, 0.0]);
        let out = move_start_point(&[square.clone(), other.clone()], [0.9, 1.1, 0.0]);
        assert_eq!(out[0][0], square[2]);
        assert_eq!(out[0][3], square[1]);
        assert_eq!(out[1], other);
    }

    #[test]
    fn targets_follow_inverted_normal() {
        let curve = vec![
            CurvePoint::with_normal([1.0, 2.0, 3.0], [0.0, 0.0, 1.0]),
            CurvePoint::xyz(0.0, 0.0, 0.0),
            CurvePoint::with_normal([0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
        ];
        let targets = curve_to_targets(&curve, true);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].z_axis(), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(targets[0].translation(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(curve_to_targets(&curve[1..2], false)[0].z_axis(), Vec3::Z);
    }

    #[test]
    fn host_arrays_with_bad_arity_fail() {
        let ok = curves_from_arrays(&[vec![vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]]]).unwrap();
        assert_eq!(ok[0][1].normal, Some([0.0, 0.0, 1.0]));
        assert!(matches!(
            curves_from_arrays(&[vec![vec![0.0, 0.0]]]),
            Err(ToolError::Point(_))
        ));
    }
}
