//! Curve points: a position with an optional surface normal.
//!
//! Hosts exchange points as flat numeric arrays, `[x, y, z]` or
//! `[x, y, z, i, j, k]`. [`CurvePoint`] is the typed form used by every
//! engine operation; conversion from a slice validates the arity.

use serde::{Deserialize, Serialize};

use super::core::{Point3, Transform, Vec3};

/// An ordered sequence of points. Order and direction are meaningful.
pub type Curve = Vec<CurvePoint>;

/// An unordered collection of independent curves.
pub type CurveSet = Vec<Curve>;

/// Errors raised when converting host point arrays.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointFormatError {
    /// A point array must hold 3 (xyz) or 6 (xyz + ijk) values.
    #[error("point arrays must have 3 or 6 values, got {arity}")]
    InvalidPointFormat { arity: usize },
}

/// A position with an optional normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub position: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<[f64; 3]>,
}

impl CurvePoint {
    /// A point with unknown normal.
    #[must_use]
    pub const fn new(position: [f64; 3]) -> Self {
        Self { position, normal: None }
    }

    #[must_use]
    pub const fn with_normal(position: [f64; 3], normal: [f64; 3]) -> Self {
        Self {
            position,
            normal: Some(normal),
        }
    }

    /// Shorthand for `CurvePoint::new([x, y, z])`.
    #[must_use]
    pub const fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self::new([x, y, z])
    }

    /// Build a point from a host array of arity 3 or 6.
    ///
    /// # Errors
    /// Returns [`PointFormatError::InvalidPointFormat`] for any other arity.
    pub fn from_slice(values: &[f64]) -> Result<Self, PointFormatError> {
        match *values {
            [x, y, z] => Ok(Self::new([x, y, z])),
            [x, y, z, i, j, k] => Ok(Self::with_normal([x, y, z], [i, j, k])),
            _ => Err(PointFormatError::InvalidPointFormat { arity: values.len() }),
        }
    }

    /// Host array form: 3 values without a normal, 6 with one.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        let mut out = self.position.to_vec();
        if let Some(normal) = self.normal {
            out.extend_from_slice(&normal);
        }
        out
    }

    /// The normal, or `fallback` when it is unknown.
    #[must_use]
    pub fn normal_or(&self, fallback: [f64; 3]) -> [f64; 3] {
        self.normal.unwrap_or(fallback)
    }

    #[must_use]
    pub const fn point3(&self) -> Point3 {
        Point3::from_array(self.position)
    }

    /// Map position and normal through a pose. The normal is only rotated.
    #[must_use]
    pub fn transformed(&self, pose: Transform) -> Self {
        Self {
            position: pose.apply_point(self.point3()).to_array(),
            normal: self.normal.map(|n| pose.apply_vec(Vec3::from_array(n)).to_array()),
        }
    }
}

impl TryFrom<&[f64]> for CurvePoint {
    type Error = PointFormatError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        Self::from_slice(values)
    }
}

impl From<[f64; 3]> for CurvePoint {
    fn from(position: [f64; 3]) -> Self {
        Self::new(position)
    }
}

impl From<[f64; 6]> for CurvePoint {
    fn from(v: [f64; 6]) -> Self {
        Self::with_normal([v[0], v[1], v[2]], [v[3], v[4], v[5]])
    }
}

/// Convert a batch of host arrays into a curve.
///
/// # Errors
/// Fails on the first array whose arity is neither 3 nor 6.
pub fn curve_from_arrays<T: AsRef<[f64]>>(arrays: &[T]) -> Result<Curve, PointFormatError> {
    arrays.iter().map(|a| CurvePoint::from_slice(a.as_ref())).collect()
}

/// Map every point of a curve through a pose.
#[must_use]
pub fn transform_curve(curve: &[CurvePoint], pose: Transform) -> Curve {
    curve.iter().map(|p| p.transformed(pose)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_accepts_three_and_six_values() {
        let p = CurvePoint::from_slice(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(p.position, [1.0, 2.0, 3.0]);
        assert!(p.normal.is_none());

        let q = CurvePoint::from_slice(&[1.0, 2.0, 3.0, 0.0, 0.0, -1.0]).unwrap();
        assert_eq!(q.normal, Some([0.0, 0.0, -1.0]));
        assert_eq!(q.to_vec(), vec![1.0, 2.0, 3.0, 0.0, 0.0, -1.0]);
    }

    #[test]
    fn from_slice_rejects_other_arities() {
        for len in [0usize, 1, 2, 4, 5, 7] {
            let values = vec![0.0; len];
            assert_eq!(
                CurvePoint::from_slice(&values),
                Err(PointFormatError::InvalidPointFormat { arity: len })
            );
        }
    }

    #[test]
    fn curve_from_arrays_reports_bad_point() {
        let arrays: Vec<Vec<f64>> = vec![vec![0.0, 0.0, 0.0], vec![1.0, 1.0]];
        assert_eq!(
            curve_from_arrays(&arrays),
            Err(PointFormatError::InvalidPointFormat { arity: 2 })
        );
    }

    #[test]
    fn transformed_rotates_normal_without_translating_it() {
        let pose = Transform::translate(Vec3::new(0.0, 0.0, 10.0)) * Transform::rotate_x(std::f64::consts::PI);
        let p = CurvePoint::with_normal([1.0, 0.0, 0.0], [0.0, 0.0, -1.0]).transformed(pose);
        assert!((p.position[2] - 10.0).abs() < 1e-12);
        let n = p.normal.unwrap();
        assert!((n[2] - 1.0).abs() < 1e-12);
    }
}
