//! Closed-form affine solve through a minimal 3-point sample.

use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};

use crate::transform::Transform;
use crate::types::Pt2;

use super::ModelEstimator;

const AREA_EPS: f64 = 1e-9;

pub struct AffineEstimator;

impl ModelEstimator for AffineEstimator {
    const MIN_SAMPLES: usize = 3;

    /// Solves the two 3×3 linear systems `[x y 1] · c = x'` and
    /// `[x y 1] · c = y'`. A collinear sample makes the system singular and
    /// yields `None`.
    fn fit(src: &[Pt2], dst: &[Pt2], sample: &[usize]) -> Option<Transform> {
        let [i0, i1, i2] = [sample[0], sample[1], sample[2]];
        let (s0, s1, s2) = (src[i0], src[i1], src[i2]);
        let (d0, d1, d2) = (dst[i0], dst[i1], dst[i2]);

        // Twice the signed triangle area; collinear samples are degenerate.
        let area = (s1.x - s0.x) * (s2.y - s0.y) - (s1.y - s0.y) * (s2.x - s0.x);
        if area.abs() < AREA_EPS {
            return None;
        }

        let m = Matrix3::new(s0.x, s0.y, 1.0, s1.x, s1.y, 1.0, s2.x, s2.y, 1.0);
        let lu = m.lu();
        let cx = lu.solve(&Vector3::new(d0.x, d1.x, d2.x))?;
        let cy = lu.solve(&Vector3::new(d0.y, d1.y, d2.y))?;

        let model = Transform::Affine {
            a: Matrix2::new(cx[0], cx[1], cy[0], cy[1]),
            t: Vector2::new(cx[2], cy[2]),
        };
        model
            .to_matrix3()
            .iter()
            .all(|v| v.is_finite())
            .then_some(model)
    }
}
