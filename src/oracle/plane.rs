use crate::geom::{
    Curve, CurvePoint, GRID_NORMAL, Point3, ProjectionError, ProjectionKind, SurfaceOracle,
    Tolerance, Vec3,
};

/// An infinite plane. Recalculated normals are the plane normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneOracle {
    origin: Point3,
    normal: Vec3,
}

impl PlaneOracle {
    /// Plane through `origin` with the given normal. `None` for a zero normal.
    #[must_use]
    pub fn new(origin: [f64; 3], normal: [f64; 3]) -> Option<Self> {
        Some(Self {
            origin: Point3::from_array(origin),
            normal: Vec3::from_array(normal).normalized()?,
        })
    }

    /// The plane `z = height` with normal +Z.
    #[must_use]
    pub const fn horizontal(height: f64) -> Self {
        Self {
            origin: Point3::new(0.0, 0.0, height),
            normal: Vec3::Z,
        }
    }

    fn signed_distance(&self, p: Point3) -> f64 {
        (p - self.origin).dot(self.normal)
    }

    fn project_one(&self, point: &CurvePoint, kind: ProjectionKind) -> CurvePoint {
        let p = point.point3();
        let landed = if kind.along_normal() {
            let dir = Vec3::from_array(point.normal_or(GRID_NORMAL));
            let denom = dir.dot(self.normal);
            if Tolerance::DEFAULT.is_zero_length(denom) {
                return *point;
            }
            p + dir * (-self.signed_distance(p) / denom)
        } else {
            p + self.normal * -self.signed_distance(p)
        };

        CurvePoint {
            position: landed.to_array(),
            normal: if kind.recalculates_normal() {
                Some(self.normal.to_array())
            } else {
                point.normal
            },
        }
    }
}

impl SurfaceOracle for PlaneOracle {
    fn project_points(&self, points: &[CurvePoint], kind: ProjectionKind) -> Result<Curve, ProjectionError> {
        Ok(points.iter().map(|p| self.project_one(p, kind)).collect())
    }
}
