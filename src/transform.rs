//! Geometric transforms fitted between piece and canvas coordinates.
//!
//! Affine transforms are stored as a 2×2 linear part plus translation,
//! homographies as a full 3×3 matrix defined up to scale. Mapping a point
//! through a homography performs the perspective divide; points whose
//! homogeneous `w` is not usable are reported as `None` so callers can drop
//! them instead of propagating non-finite values.

use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};
use serde::Serialize;

use crate::types::Pt2;

const EPS: f64 = 1e-12;

#[derive(Clone, Copy, Debug, Serialize)]
pub enum Transform {
    Affine { a: Matrix2<f64>, t: Vector2<f64> },
    Homography(Matrix3<f64>),
}

impl Transform {
    /// Affine transform from two 3-value rows `[a b tx; c d ty]`.
    pub fn from_affine_rows(rows: [[f64; 3]; 2]) -> Self {
        Transform::Affine {
            a: Matrix2::new(rows[0][0], rows[0][1], rows[1][0], rows[1][1]),
            t: Vector2::new(rows[0][2], rows[1][2]),
        }
    }

    pub fn identity_affine() -> Self {
        Transform::Affine {
            a: Matrix2::identity(),
            t: Vector2::zeros(),
        }
    }

    /// Map a single point. `None` marks an invalid image (non-finite result
    /// or a homogeneous `w` too close to zero).
    pub fn apply_point(&self, p: Pt2) -> Option<Pt2> {
        match self {
            Transform::Affine { a, t } => {
                let v = a * Vector2::new(p.x, p.y) + t;
                (v.x.is_finite() && v.y.is_finite()).then(|| Pt2::new(v.x, v.y))
            }
            Transform::Homography(h) => {
                let v = h * Vector3::new(p.x, p.y, 1.0);
                let w = v.z;
                if !w.is_finite() || w.abs() <= EPS || !v.x.is_finite() || !v.y.is_finite() {
                    return None;
                }
                Some(Pt2::new(v.x / w, v.y / w))
            }
        }
    }

    /// Map a point set; each entry is `None` where the image is invalid.
    pub fn apply_points(&self, pts: &[Pt2]) -> Vec<Option<Pt2>> {
        pts.iter().map(|&p| self.apply_point(p)).collect()
    }

    /// Inverse transform, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Transform> {
        match self {
            Transform::Affine { a, t } => {
                let inv = a.try_inverse()?;
                Some(Transform::Affine {
                    a: inv,
                    t: -(inv * t),
                })
            }
            Transform::Homography(h) => h.try_inverse().map(Transform::Homography),
        }
    }

    /// Promote to a homogeneous 3×3 matrix.
    pub fn to_matrix3(&self) -> Matrix3<f64> {
        match self {
            Transform::Affine { a, t } => Matrix3::new(
                a[(0, 0)],
                a[(0, 1)],
                t.x,
                a[(1, 0)],
                a[(1, 1)],
                t.y,
                0.0,
                0.0,
                1.0,
            ),
            Transform::Homography(h) => *h,
        }
    }
}
