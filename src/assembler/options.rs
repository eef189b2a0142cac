use serde::{Deserialize, Serialize};

use crate::estimate::{ModelFamily, RansacOptions};
use crate::matching::MatcherOptions;

/// Tunables for one assembly run.
///
/// `inlier_thresh` and `min_inliers` default per model family when left
/// unset: the affine fit tolerates looser residuals with minimal support,
/// the homography fit uses a tighter threshold and a higher floor.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyParams {
    /// Model family fitted between every piece and the mosaic.
    pub model: ModelFamily,
    /// Nearest / second-nearest descriptor ratio (strict `<`).
    pub ratio_threshold: f32,
    /// RANSAC iteration cap.
    pub max_iters: usize,
    /// Inlier residual threshold in pixels; `None` uses the family default.
    pub inlier_thresh: Option<f64>,
    /// Minimum inlier count for a model to qualify; `None` uses the family
    /// default.
    pub min_inliers: Option<usize>,
    /// Base RNG seed; each piece derives its own seed from this and its id.
    pub seed: u64,
}

impl Default for AssemblyParams {
    fn default() -> Self {
        Self {
            model: ModelFamily::Affine,
            ratio_threshold: 0.7,
            max_iters: 1000,
            inlier_thresh: None,
            min_inliers: None,
            seed: 0,
        }
    }
}

impl AssemblyParams {
    pub fn matcher_options(&self) -> MatcherOptions {
        MatcherOptions {
            ratio_threshold: self.ratio_threshold,
        }
    }

    /// Resolved RANSAC options for the piece with the given id.
    pub fn ransac_options(&self, piece_id: usize) -> RansacOptions {
        let defaults = self.model.default_options();
        RansacOptions {
            max_iters: self.max_iters,
            thresh: self.inlier_thresh.unwrap_or(defaults.thresh),
            min_inliers: self.min_inliers.unwrap_or(defaults.min_inliers),
            seed: self.seed.wrapping_add(piece_id as u64),
        }
    }
}
