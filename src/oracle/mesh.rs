//! Triangle mesh surface oracle.
//!
//! Along-normal projection casts a line through each point along its normal
//! (−Z when unknown) and takes the hit nearest to the point, in front or
//! behind. Closest projection finds the nearest point on any triangle. Both
//! queries go through a BVH. Recalculated normals follow the triangle winding.

use crate::geom::{
    BBox, Curve, CurvePoint, GRID_NORMAL, Point3, ProjectionError, ProjectionKind, SurfaceOracle,
    Tolerance, Vec3,
};

use super::bvh::Bvh;

/// Errors raised when building a [`TriangleMesh`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("mesh has no triangles")]
    Empty,

    #[error("triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("mesh has {count} triangles, more than a BVH can index")]
    TooLarge { count: usize },
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    a: Point3,
    b: Point3,
    c: Point3,
}

impl Triangle {
    fn bbox(self) -> BBox {
        BBox::new(self.a, self.a).expand_point(self.b).expand_point(self.c)
    }

    /// Unit normal following the winding, `None` for degenerate triangles.
    fn normal(self) -> Option<Vec3> {
        (self.b - self.a).cross(self.c - self.a).normalized()
    }

    /// Möller–Trumbore line intersection. Returns the signed line parameter,
    /// which may be negative.
    fn intersect_line(self, origin: Point3, dir: Vec3, tol: Tolerance) -> Option<f64> {
        let edge1 = self.b - self.a;
        let edge2 = self.c - self.a;
        let h = dir.cross(edge2);
        let det = edge1.dot(h);
        let det_eps = tol.eps * edge1.length() * h.length();
        if !det.is_finite() || det.abs() <= det_eps {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = origin - self.a;
        let u = inv_det * s.dot(h);
        if u < -tol.eps || u > 1.0 + tol.eps {
            return None;
        }

        let q = s.cross(edge1);
        let v = inv_det * dir.dot(q);
        if v < -tol.eps || u + v > 1.0 + tol.eps {
            return None;
        }

        let t = inv_det * edge2.dot(q);
        t.is_finite().then_some(t)
    }

    /// Closest point on the triangle (Ericson, Real-Time Collision
    /// Detection, 5.1.5).
    fn closest_point(self, p: Point3) -> Point3 {
        let ab = self.b - self.a;
        let ac = self.c - self.a;
        let ap = p - self.a;
        let d1 = ab.dot(ap);
        let d2 = ac.dot(ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.a;
        }

        let bp = p - self.b;
        let d3 = ab.dot(bp);
        let d4 = ac.dot(bp);
        if d3 >= 0.0 && d4 <= d3 {
            return self.b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return self.a + ab * v;
        }

        let cp = p - self.c;
        let d5 = ab.dot(cp);
        let d6 = ac.dot(cp);
        if d6 >= 0.0 && d5 <= d6 {
            return self.c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return self.a + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.b + (self.c - self.b) * w;
        }

        let denom = 1.0 / (va + vb + vc);
        let v = vb * denom;
        let w = vc * denom;
        self.a + ab * v + ac * w
    }
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    vertices: Vec<[f64; 3]>,
    triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// # Errors
    /// [`MeshError::Empty`] without triangles and
    /// [`MeshError::IndexOutOfRange`] for dangling vertex indices.
    pub fn new(vertices: Vec<[f64; 3]>, triangles: Vec<[u32; 3]>) -> Result<Self, MeshError> {
        if triangles.is_empty() {
            return Err(MeshError::Empty);
        }
        for (triangle, tri) in triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertices.len()) {
                return Err(MeshError::IndexOutOfRange {
                    triangle,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }
        Ok(Self { vertices, triangles })
    }

    #[must_use]
    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    #[must_use]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    fn triangle(&self, index: usize) -> Triangle {
        let [a, b, c] = self.triangles[index];
        Triangle {
            a: Point3::from_array(self.vertices[a as usize]),
            b: Point3::from_array(self.vertices[b as usize]),
            c: Point3::from_array(self.vertices[c as usize]),
        }
    }
}

/// BVH primitive indices are `u32`.
fn check_triangle_count(count: usize) -> Result<(), MeshError> {
    u32::try_from(count).map(|_| ()).map_err(|_| MeshError::TooLarge { count })
}

/// Surface oracle over a [`TriangleMesh`].
#[derive(Debug, Clone)]
pub struct MeshOracle {
    mesh: TriangleMesh,
    bvh: Bvh,
    max_distance: f64,
    tolerance: Tolerance,
}

impl MeshOracle {
    /// Build the oracle and its BVH.
    ///
    /// # Errors
    /// [`MeshError::TooLarge`] if the mesh has more triangles than the BVH
    /// can index.
    pub fn new(mesh: TriangleMesh) -> Result<Self, MeshError> {
        let count = mesh.triangles.len();
        check_triangle_count(count)?;
        let boxes: Vec<BBox> = (0..count).map(|i| mesh.triangle(i).bbox()).collect();
        let bvh = Bvh::build(&boxes).ok_or(MeshError::TooLarge { count })?;
        log::debug!("mesh oracle: {} triangles indexed", boxes.len());
        Ok(Self {
            mesh,
            bvh,
            max_distance: f64::INFINITY,
            tolerance: Tolerance::DEFAULT,
        })
    }

    /// Ignore along-normal hits farther than `distance` from the point.
    #[must_use]
    pub fn with_max_distance(mut self, distance: f64) -> Self {
        self.max_distance = distance.abs();
        self
    }

    #[must_use]
    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    /// Hit nearest to `origin` on the line through it along `dir`.
    fn cast(&self, origin: Point3, dir: Vec3) -> Option<(f64, usize)> {
        let mut best: Option<(f64, usize)> = None;
        self.bvh.query_line(origin, dir, -self.max_distance, self.max_distance, |prim| {
            if let Some(t) = self.mesh.triangle(prim).intersect_line(origin, dir, self.tolerance) {
                if t.abs() <= self.max_distance && best.is_none_or(|(bt, _)| t.abs() < bt.abs()) {
                    best = Some((t, prim));
                }
            }
            true
        });
        best
    }

    fn project_one(&self, point: &CurvePoint, kind: ProjectionKind) -> CurvePoint {
        let origin = point.point3();
        let hit = if kind.along_normal() {
            let Some(dir) = Vec3::from_array(point.normal_or(GRID_NORMAL)).normalized() else {
                return *point;
            };
            self.cast(origin, dir).map(|(t, prim)| (origin + dir * t, prim))
        } else {
            self.bvh
                .nearest(origin, |prim| {
                    Some(self.mesh.triangle(prim).closest_point(origin).distance_squared_to(origin))
                })
                .map(|(prim, _)| (self.mesh.triangle(prim).closest_point(origin), prim))
        };

        let Some((landed, prim)) = hit else {
            return *point;
        };

        let normal = if kind.recalculates_normal() {
            self.mesh.triangle(prim).normal().map(Vec3::to_array).or(point.normal)
        } else {
            point.normal
        };

        CurvePoint {
            position: landed.to_array(),
            normal,
        }
    }
}

impl SurfaceOracle for MeshOracle {
    fn project_points(&self, points: &[CurvePoint], kind: ProjectionKind) -> Result<Curve, ProjectionError> {
        Ok(points.iter().map(|p| self.project_one(p, kind)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    /// Unit square at height `z`, wound counter-clockwise seen from +Z.
    fn square(z: f64) -> TriangleMesh {
        TriangleMesh::new(
            vec![[0.0, 0.0, z], [1.0, 0.0, z], [1.0, 1.0, z], [0.0, 1.0, z]],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn mesh_rejects_dangling_indices() {
        let err = TriangleMesh::new(vec![[0.0; 3]], vec![[0, 1, 2]]).unwrap_err();
        assert_eq!(
            err,
            MeshError::IndexOutOfRange {
                triangle: 0,
                index: 1,
                vertex_count: 1
            }
        );
        assert_eq!(TriangleMesh::new(vec![], vec![]).unwrap_err(), MeshError::Empty);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_mesh_is_reported() {
        let count = usize::try_from(u32::MAX).unwrap() + 1;
        assert_eq!(check_triangle_count(count), Err(MeshError::TooLarge { count }));
        assert_eq!(check_triangle_count(2), Ok(()));
    }

    #[test]
    fn closest_point_regions() {
        let tri = Triangle {
            a: Point3::new(0.0, 0.0, 0.0),
            b: Point3::new(1.0, 0.0, 0.0),
            c: Point3::new(0.0, 1.0, 0.0),
        };
        assert_eq!(tri.closest_point(Point3::new(-1.0, -1.0, 0.0)), tri.a);
        assert_eq!(tri.closest_point(Point3::new(0.25, 0.25, 3.0)), Point3::new(0.25, 0.25, 0.0));
        let edge = tri.closest_point(Point3::new(0.5, -2.0, 0.0));
        assert!(approx_eq(edge.to_array(), [0.5, 0.0, 0.0]));
        let hyp = tri.closest_point(Point3::new(1.0, 1.0, 0.0));
        assert!(approx_eq(hyp.to_array(), [0.5, 0.5, 0.0]));
    }

    #[test]
    fn along_normal_hits_surface_behind_point() {
        let oracle = MeshOracle::new(square(0.0)).unwrap();
        // Point below the surface, normal pointing further down.
        let p = CurvePoint::with_normal([0.5, 0.5, -2.0], [0.0, 0.0, -1.0]);
        let out = oracle.project_points(&[p], ProjectionKind::AlongNormalRecalc).unwrap();
        assert!(approx_eq(out[0].position, [0.5, 0.5, 0.0]));
        assert!(approx_eq(out[0].normal.unwrap(), [0.0, 0.0, 1.0]));
    }

    #[test]
    fn miss_returns_point_unchanged() {
        let oracle = MeshOracle::new(square(0.0)).unwrap();
        let p = CurvePoint::xyz(5.0, 5.0, 3.0);
        let out = oracle.project_points(&[p], ProjectionKind::AlongNormal).unwrap();
        assert_eq!(out[0], p);

        let capped = MeshOracle::new(square(0.0)).unwrap().with_max_distance(1.0);
        let far = CurvePoint::xyz(0.5, 0.5, 3.0);
        assert_eq!(capped.project_points(&[far], ProjectionKind::AlongNormal).unwrap()[0], far);
    }

    #[test]
    fn closest_projection_clamps_to_edge() {
        let oracle = MeshOracle::new(square(1.0)).unwrap();
        let p = CurvePoint::xyz(2.0, 0.5, 1.0);
        let out = oracle.project_points(&[p], ProjectionKind::ClosestRecalc).unwrap();
        assert!(approx_eq(out[0].position, [1.0, 0.5, 1.0]));
        assert!(approx_eq(out[0].normal.unwrap(), [0.0, 0.0, 1.0]));
    }
}
