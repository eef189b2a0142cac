//! Minimal 4-point homography via the homogeneous DLT system.

use nalgebra::{DMatrix, Matrix3};

use crate::transform::Transform;
use crate::types::Pt2;

use super::ModelEstimator;

pub struct HomographyEstimator;

impl ModelEstimator for HomographyEstimator {
    const MIN_SAMPLES: usize = 4;

    /// Solves `A h = 0` (8×9) by SVD, taking the right singular vector of the
    /// smallest singular value. Degenerate source quads (coincident points,
    /// three collinear) are rejected before the solve; the resulting matrix
    /// is additionally rejected when it is singular or non-finite.
    fn fit(src: &[Pt2], dst: &[Pt2], sample: &[usize]) -> Option<Transform> {
        let pts: Vec<Pt2> = sample.iter().map(|&idx| src[idx]).collect();
        if degenerate_sample(&pts) {
            return None;
        }

        // nalgebra computes a thin SVD, so an 8×9 system yields only eight
        // right singular vectors and never the null-space one. Padding with a
        // zero row (an identical `0·h = 0` constraint) makes `v_t` full 9×9.
        let mut a = DMatrix::<f64>::zeros((2 * sample.len()).max(9), 9);

        for (i, &idx) in sample.iter().enumerate() {
            let (p, q) = (src[idx], dst[idx]);
            let (x, y, u, v) = (p.x, p.y, q.x, q.y);

            let r0 = 2 * i;
            let r1 = 2 * i + 1;

            a[(r0, 0)] = -x;
            a[(r0, 1)] = -y;
            a[(r0, 2)] = -1.0;
            a[(r0, 6)] = u * x;
            a[(r0, 7)] = u * y;
            a[(r0, 8)] = u;

            a[(r1, 3)] = -x;
            a[(r1, 4)] = -y;
            a[(r1, 5)] = -1.0;
            a[(r1, 6)] = v * x;
            a[(r1, 7)] = v * y;
            a[(r1, 8)] = v;
        }

        let svd = a.svd(false, true);
        let v_t = svd.v_t?;
        let h = v_t.row(v_t.nrows() - 1);

        let mut h_mat = Matrix3::zeros();
        for r in 0..3 {
            for c in 0..3 {
                h_mat[(r, c)] = h[3 * r + c];
            }
        }

        // Normalise to H[2,2] == 1 when possible; H stays defined up to scale.
        let scale = h_mat[(2, 2)];
        if scale.abs() > f64::EPSILON {
            h_mat /= scale;
        }

        if !h_mat.iter().all(|v| v.is_finite()) || h_mat.determinant().abs() < 1e-12 {
            return None;
        }
        Some(Transform::Homography(h_mat))
    }
}

/// Coincident pairs and collinear triples leave the DLT system
/// rank-deficient with an arbitrary null-space vector; reject them up front.
fn degenerate_sample(pts: &[Pt2]) -> bool {
    for i in 0..pts.len() {
        for j in (i + 1)..pts.len() {
            if (pts[i] - pts[j]).norm_squared() < 1e-12 {
                return true;
            }
            for k in (j + 1)..pts.len() {
                let area = (pts[j].x - pts[i].x) * (pts[k].y - pts[i].y)
                    - (pts[j].y - pts[i].y) * (pts[k].x - pts[i].x);
                if area.abs() < 1e-9 {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_square_to_scaled_square() {
        let src = [
            Pt2::new(0.0, 0.0),
            Pt2::new(1.0, 0.0),
            Pt2::new(1.0, 1.0),
            Pt2::new(0.0, 1.0),
        ];
        let dst = [
            Pt2::new(0.0, 0.0),
            Pt2::new(2.0, 0.0),
            Pt2::new(2.0, 2.0),
            Pt2::new(0.0, 2.0),
        ];
        let model = HomographyEstimator::fit(&src, &dst, &[0, 1, 2, 3]).unwrap();
        for (&s, &d) in src.iter().zip(&dst) {
            assert!((model.apply_point(s).unwrap() - d).norm() < 1e-9);
        }
    }

    #[test]
    fn perspective_quad_is_fit_exactly() {
        let truth = Transform::Homography(Matrix3::new(
            0.9, 0.05, 12.0, -0.08, 1.1, -4.0, 3e-4, -1e-4, 1.0,
        ));
        let src = [
            Pt2::new(5.0, 8.0),
            Pt2::new(120.0, 12.0),
            Pt2::new(115.0, 140.0),
            Pt2::new(9.0, 130.0),
        ];
        let dst: Vec<Pt2> = src.iter().map(|&p| truth.apply_point(p).unwrap()).collect();
        let model = HomographyEstimator::fit(&src, &dst, &[0, 1, 2, 3]).unwrap();
        for (&s, &d) in src.iter().zip(&dst) {
            assert!((model.apply_point(s).unwrap() - d).norm() < 1e-6);
        }
    }

    #[test]
    fn repeated_points_are_degenerate() {
        let src = [
            Pt2::new(0.0, 0.0),
            Pt2::new(0.0, 0.0),
            Pt2::new(1.0, 1.0),
            Pt2::new(0.0, 1.0),
        ];
        let dst = src;
        assert!(HomographyEstimator::fit(&src, &dst, &[0, 1, 2, 3]).is_none());
    }
}
