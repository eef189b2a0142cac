//! Robust transform estimation from noisy correspondences.
//!
//! A single RANSAC engine serves both model families; the family-specific
//! parts (minimal sample size, exact solve, degeneracy) live behind the
//! [`ModelEstimator`] trait. No refinement pass runs over the final inlier
//! set: the winning minimal-sample model is returned as-is.

pub mod affine;
pub mod homography;

pub use affine::AffineEstimator;
pub use homography::HomographyEstimator;

use rand::prelude::IndexedRandom;
use rand::{rngs::StdRng, SeedableRng};

use crate::transform::Transform;
use crate::types::Pt2;

/// Configuration for one RANSAC invocation.
#[derive(Clone, Copy, Debug)]
pub struct RansacOptions {
    /// Fixed iteration cap.
    pub max_iters: usize,
    /// Inlier residual threshold in pixels (strict `<`).
    pub thresh: f64,
    /// Acceptance floor: a model with fewer inliers never becomes best.
    pub min_inliers: usize,
    /// Random-number generator seed (for reproducibility).
    pub seed: u64,
}

impl RansacOptions {
    /// Affine defaults: loose threshold, minimal support.
    pub fn affine() -> Self {
        Self {
            max_iters: 1000,
            thresh: 5.0,
            min_inliers: 3,
            seed: 0,
        }
    }

    /// Homography defaults: tighter threshold and a higher inlier floor,
    /// since the projective solve is more sensitive to noise.
    pub fn homography() -> Self {
        Self {
            max_iters: 1000,
            thresh: 2.0,
            min_inliers: 10,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Outcome of a RANSAC run. `model == None` means no candidate ever met the
/// acceptance floor.
#[derive(Clone, Debug)]
pub struct RansacResult {
    pub model: Option<Transform>,
    pub inlier_count: usize,
}

impl RansacResult {
    fn none() -> Self {
        Self {
            model: None,
            inlier_count: 0,
        }
    }
}

/// Family-specific minimal solve for the shared RANSAC engine.
pub trait ModelEstimator {
    /// Minimal number of correspondences for an exact solve.
    const MIN_SAMPLES: usize;

    /// Fit the exact model through the sampled correspondences.
    ///
    /// Return `None` for degenerate samples (collinear points, singular
    /// systems); the engine skips the iteration.
    fn fit(src: &[Pt2], dst: &[Pt2], sample: &[usize]) -> Option<Transform>;
}

/// Which model family to fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Affine,
    Homography,
}

impl ModelFamily {
    pub fn min_samples(self) -> usize {
        match self {
            ModelFamily::Affine => AffineEstimator::MIN_SAMPLES,
            ModelFamily::Homography => HomographyEstimator::MIN_SAMPLES,
        }
    }

    pub fn default_options(self) -> RansacOptions {
        match self {
            ModelFamily::Affine => RansacOptions::affine(),
            ModelFamily::Homography => RansacOptions::homography(),
        }
    }
}

/// Fit the requested family; convenience dispatcher over [`ransac`].
pub fn estimate_transform(
    family: ModelFamily,
    src: &[Pt2],
    dst: &[Pt2],
    opts: &RansacOptions,
) -> RansacResult {
    match family {
        ModelFamily::Affine => ransac::<AffineEstimator>(src, dst, opts),
        ModelFamily::Homography => ransac::<HomographyEstimator>(src, dst, opts),
    }
}

/// Run the RANSAC loop for one model family.
///
/// Per iteration: draw `MIN_SAMPLES` distinct indices, solve the exact model,
/// count correspondences whose mapped-source-to-destination distance is
/// strictly below `opts.thresh`. A candidate replaces the best only with a
/// strictly greater inlier count that also meets `opts.min_inliers`, so ties
/// keep the earlier model. Never panics; with insufficient or mismatched
/// input it returns the no-model result.
pub fn ransac<E: ModelEstimator>(src: &[Pt2], dst: &[Pt2], opts: &RansacOptions) -> RansacResult {
    let mut best = RansacResult::none();
    if src.len() != dst.len() || src.len() < E::MIN_SAMPLES {
        return best;
    }

    let all_indices: Vec<usize> = (0..src.len()).collect();
    let mut sample = vec![0usize; E::MIN_SAMPLES];
    let mut rng = StdRng::seed_from_u64(opts.seed);

    for _ in 0..opts.max_iters {
        all_indices
            .as_slice()
            .choose_multiple(&mut rng, E::MIN_SAMPLES)
            .enumerate()
            .for_each(|(k, &idx)| sample[k] = idx);

        let Some(model) = E::fit(src, dst, &sample) else {
            continue;
        };

        let mut inlier_count = 0usize;
        for (&s, &d) in src.iter().zip(dst.iter()) {
            // Invalid images (w ~ 0 under a homography) are simply not inliers.
            let Some(mapped) = model.apply_point(s) else {
                continue;
            };
            if (mapped - d).norm() < opts.thresh {
                inlier_count += 1;
            }
        }

        if inlier_count >= opts.min_inliers && inlier_count > best.inlier_count {
            best = RansacResult {
                model: Some(model),
                inlier_count,
            };
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix2, Matrix3, Vector2};

    fn apply_all(t: &Transform, pts: &[Pt2]) -> Vec<Pt2> {
        pts.iter().map(|&p| t.apply_point(p).unwrap()).collect()
    }

    fn spread_points(n: usize) -> Vec<Pt2> {
        (0..n)
            .map(|i| {
                let x = (i % 7) as f64 * 13.0 + (i / 7) as f64 * 3.5;
                let y = (i % 5) as f64 * 17.0 - (i / 5) as f64 * 2.0;
                Pt2::new(x, y)
            })
            .collect()
    }

    #[test]
    fn too_few_correspondences_yield_no_model() {
        let pts = spread_points(2);
        let res = ransac::<AffineEstimator>(&pts, &pts, &RansacOptions::affine());
        assert!(res.model.is_none());
        assert_eq!(res.inlier_count, 0);
    }

    #[test]
    fn exact_affine_correspondences_are_all_inliers() {
        let truth = Transform::Affine {
            a: Matrix2::new(1.2, -0.4, 0.3, 0.9),
            t: Vector2::new(40.0, -7.0),
        };
        let src = spread_points(20);
        let dst = apply_all(&truth, &src);
        let res = ransac::<AffineEstimator>(&src, &dst, &RansacOptions::affine());
        assert_eq!(res.inlier_count, src.len());
        let model = res.model.unwrap();
        for (&s, &d) in src.iter().zip(&dst) {
            assert!((model.apply_point(s).unwrap() - d).norm() < 1e-6);
        }
    }

    #[test]
    fn affine_survives_majority_outliers() {
        let truth = Transform::Affine {
            a: Matrix2::new(0.9, 0.1, -0.2, 1.1),
            t: Vector2::new(5.0, 12.0),
        };
        let src = spread_points(30);
        let mut dst = apply_all(&truth, &src);
        // Corrupt 60% of the correspondences.
        for (i, d) in dst.iter_mut().enumerate() {
            if i % 5 != 0 && i % 5 != 1 {
                d.x += 200.0 + ((i * i * 37) % 211) as f64;
                d.y -= 150.0 + ((i * i * 53) % 191) as f64;
            }
        }
        let res = ransac::<AffineEstimator>(&src, &dst, &RansacOptions::affine());
        assert_eq!(res.inlier_count, 12);
    }

    #[test]
    fn same_seed_is_reproducible() {
        let truth = Transform::Affine {
            a: Matrix2::identity(),
            t: Vector2::new(3.0, 4.0),
        };
        let src = spread_points(15);
        let mut dst = apply_all(&truth, &src);
        dst[3].x += 90.0;
        dst[8].y -= 60.0;
        let opts = RansacOptions::affine().with_seed(7);
        let a = ransac::<AffineEstimator>(&src, &dst, &opts);
        let b = ransac::<AffineEstimator>(&src, &dst, &opts);
        assert_eq!(a.inlier_count, b.inlier_count);
        let (ma, mb) = (a.model.unwrap().to_matrix3(), b.model.unwrap().to_matrix3());
        assert_eq!(ma, mb);
    }

    #[test]
    fn inlier_floor_rejects_weak_models() {
        let src = spread_points(8);
        let dst = spread_points(8);
        let opts = RansacOptions {
            min_inliers: 9, // unreachable with 8 correspondences
            ..RansacOptions::affine()
        };
        let res = ransac::<AffineEstimator>(&src, &dst, &opts);
        assert!(res.model.is_none());
    }

    #[test]
    fn homography_excludes_injected_outlier() {
        let truth = Transform::Homography(Matrix3::new(
            1.05, 0.02, 8.0, -0.01, 0.98, -5.0, 1e-4, -2e-4, 1.0,
        ));
        let mut src = vec![
            Pt2::new(10.0, 10.0),
            Pt2::new(110.0, 18.0),
            Pt2::new(95.0, 120.0),
            Pt2::new(6.0, 105.0),
            Pt2::new(60.0, 64.0),
            Pt2::new(130.0, 90.0),
        ];
        let mut dst: Vec<Pt2> = apply_all(&truth, &src);
        // One wildly wrong correspondence.
        let outlier_src = Pt2::new(50.0, 55.0);
        let outlier_dst = Pt2::new(400.0, -300.0);
        src.push(outlier_src);
        dst.push(outlier_dst);

        let opts = RansacOptions {
            min_inliers: 4,
            thresh: 0.5,
            ..RansacOptions::homography()
        };
        let res = ransac::<HomographyEstimator>(&src, &dst, &opts);
        assert_eq!(res.inlier_count, 6);
        let model = res.model.unwrap();
        for (&s, &d) in src.iter().zip(&dst).take(6) {
            assert!((model.apply_point(s).unwrap() - d).norm() < 0.5);
        }
        let mapped_outlier = model.apply_point(outlier_src).unwrap();
        assert!((mapped_outlier - outlier_dst).norm() >= 0.5);
    }
}
