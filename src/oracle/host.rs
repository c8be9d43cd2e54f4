use crate::geom::{Curve, CurvePoint, ProjectionError, ProjectionKind, SurfaceOracle, curve_from_arrays};

/// Adapter for hosts that exchange points as flat arrays.
///
/// The callback receives `[x, y, z]` or `[x, y, z, i, j, k]` arrays and must
/// answer with arrays of the same kind. Arrays of any other arity are
/// reported as [`ProjectionError::InvalidPoint`], and callback failures as
/// [`ProjectionError::Oracle`].
pub struct ArrayOracle<F> {
    project: F,
    supported: Vec<ProjectionKind>,
}

impl<F> ArrayOracle<F>
where
    F: Fn(&[Vec<f64>], ProjectionKind) -> Result<Vec<Vec<f64>>, String>,
{
    /// Adapter supporting every projection kind.
    pub fn new(project: F) -> Self {
        Self {
            project,
            supported: vec![
                ProjectionKind::AlongNormal,
                ProjectionKind::AlongNormalRecalc,
                ProjectionKind::Closest,
                ProjectionKind::ClosestRecalc,
            ],
        }
    }

    /// Restrict the kinds the host can service.
    #[must_use]
    pub fn supporting(mut self, kinds: &[ProjectionKind]) -> Self {
        self.supported = kinds.to_vec();
        self
    }
}

impl<F> SurfaceOracle for ArrayOracle<F>
where
    F: Fn(&[Vec<f64>], ProjectionKind) -> Result<Vec<Vec<f64>>, String>,
{
    fn supports(&self, kind: ProjectionKind) -> bool {
        self.supported.contains(&kind)
    }

    fn project_points(&self, points: &[CurvePoint], kind: ProjectionKind) -> Result<Curve, ProjectionError> {
        let arrays: Vec<Vec<f64>> = points.iter().map(CurvePoint::to_vec).collect();
        let answered = (self.project)(&arrays, kind).map_err(ProjectionError::Oracle)?;
        Ok(curve_from_arrays(&answered)?)
    }
}

impl<F> std::fmt::Debug for ArrayOracle<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayOracle").field("supported", &self.supported).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{PointFormatError, ProjectionMode, project};

    #[test]
    fn host_arrays_round_trip_through_adapter() {
        let oracle = ArrayOracle::new(|points: &[Vec<f64>], _kind| {
            Ok(points.iter().map(|p| vec![p[0], p[1], 0.0, 0.0, 0.0, 1.0]).collect())
        });
        let curve = vec![CurvePoint::xyz(1.0, 2.0, 5.0)];
        let out = project(&curve, &oracle, ProjectionMode::OnSurfaceAlongNormal, true).unwrap();
        assert_eq!(out[0], CurvePoint::with_normal([1.0, 2.0, 0.0], [0.0, 0.0, 1.0]));
    }

    #[test]
    fn bad_arity_and_host_failure_are_reported() {
        let bad = ArrayOracle::new(|points: &[Vec<f64>], _kind| Ok(points.iter().map(|_| vec![0.0; 4]).collect()));
        let curve = vec![CurvePoint::xyz(0.0, 0.0, 0.0)];
        assert_eq!(
            project(&curve, &bad, ProjectionMode::OnSurfaceClosest, false).unwrap_err(),
            ProjectionError::InvalidPoint(PointFormatError::InvalidPointFormat { arity: 4 })
        );

        let failing = ArrayOracle::new(|_: &[Vec<f64>], _kind| Err("host offline".to_string()));
        assert_eq!(
            project(&curve, &failing, ProjectionMode::OnSurfaceClosest, false).unwrap_err(),
            ProjectionError::Oracle("host offline".to_string())
        );
    }

    #[test]
    fn unsupported_kind_is_not_forwarded() {
        let oracle = ArrayOracle::new(|_: &[Vec<f64>], _kind| -> Result<Vec<Vec<f64>>, String> {
            panic!("host must not be called")
        })
        .supporting(&[ProjectionKind::AlongNormal]);
        let curve = vec![CurvePoint::xyz(0.0, 0.0, 0.0)];
        assert_eq!(
            project(&curve, &oracle, ProjectionMode::OnSurfaceAlongNormal, true).unwrap_err(),
            ProjectionError::OracleUnavailable {
                kind: ProjectionKind::AlongNormalRecalc
            }
        );
    }
}
