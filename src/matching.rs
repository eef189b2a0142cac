//! Putative correspondences via the nearest / second-nearest ratio test.
//!
//! For each mosaic keypoint the two closest piece descriptors (Euclidean
//! distance) are found; the match is kept only when the distance ratio is
//! strictly below the threshold. Boundary ties are rejected. Several mosaic
//! keypoints may map to the same piece keypoint; no deduplication happens
//! here, consistency is RANSAC's job.

use crate::error::AssemblyError;
use crate::features::Keypoint;

/// Index pair into the two keypoint collections of one matching call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Correspondence {
    pub mosaic_idx: usize,
    pub piece_idx: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct MatcherOptions {
    /// Nearest / second-nearest acceptance ratio (strict `<`).
    pub ratio_threshold: f32,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            ratio_threshold: 0.7,
        }
    }
}

/// Match mosaic keypoints against piece keypoints.
///
/// Errors with [`AssemblyError::InsufficientFeatures`] when either collection
/// is empty. A piece collection of size 1 has no second-nearest neighbour, so
/// every candidate is rejected and the result is empty.
pub fn match_features(
    mosaic: &[Keypoint],
    piece: &[Keypoint],
    opts: &MatcherOptions,
) -> Result<Vec<Correspondence>, AssemblyError> {
    if mosaic.is_empty() || piece.is_empty() {
        return Err(AssemblyError::InsufficientFeatures);
    }
    if piece.len() < 2 {
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    for (mosaic_idx, query) in mosaic.iter().enumerate() {
        let mut best: Option<(usize, f32)> = None;
        let mut second_best = f32::INFINITY;

        for (piece_idx, train) in piece.iter().enumerate() {
            let d = euclidean(&query.descriptor, &train.descriptor);
            match best {
                None => best = Some((piece_idx, d)),
                Some((_, best_d)) => {
                    if d < best_d {
                        second_best = best_d;
                        best = Some((piece_idx, d));
                    } else if d < second_best {
                        second_best = d;
                    }
                }
            }
        }

        if let Some((piece_idx, d1)) = best {
            // NaN ratio (d1 == d2 == 0) falls through to rejection.
            if d1 / second_best < opts.ratio_threshold {
                matches.push(Correspondence {
                    mosaic_idx,
                    piece_idx,
                });
            }
        }
    }
    Ok(matches)
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "descriptor length mismatch");
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
