//! Built-in Harris corner detector with normalized intensity-patch
//! descriptors.
//!
//! Corner response is the classic `det(M) - k * trace(M)^2` over a square
//! gradient-accumulation block, followed by 3×3 non-maximum suppression.
//! Descriptors are mean-subtracted, L2-normalized square patches, which makes
//! them invariant to brightness offset and contrast scale but not to
//! rotation.

use crate::image::ImageU8;
use crate::types::Pt2;

use super::{FeatureDetector, Keypoint};

#[derive(Clone, Copy, Debug)]
pub struct HarrisPatchOptions {
    /// Side of the gradient accumulation window (odd).
    pub block_size: usize,
    /// Harris sensitivity constant.
    pub k: f64,
    /// Absolute response floor; 0.0 keeps every local maximum.
    pub response_threshold: f64,
    /// Keep at most this many strongest corners.
    pub max_features: usize,
    /// Descriptor patch half-width; descriptor length is `(2r+1)^2`.
    pub patch_radius: usize,
}

impl Default for HarrisPatchOptions {
    fn default() -> Self {
        Self {
            block_size: 5,
            k: 0.04,
            response_threshold: 0.0,
            max_features: 2000,
            patch_radius: 8,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct HarrisPatchDetector {
    opts: HarrisPatchOptions,
}

impl HarrisPatchDetector {
    pub fn new(opts: HarrisPatchOptions) -> Self {
        Self { opts }
    }
}

impl FeatureDetector for HarrisPatchDetector {
    fn detect(&self, image: ImageU8<'_>) -> Vec<Keypoint> {
        let o = &self.opts;
        let w = image.w;
        let h = image.h;
        let half_block = (o.block_size / 2) as i64;
        // Keep the descriptor patch fully inside the image.
        let margin = (half_block + 1).max(o.patch_radius as i64) + 1;
        if (w as i64) <= 2 * margin || (h as i64) <= 2 * margin {
            return Vec::new();
        }

        let (gx, gy) = sobel_gradients(&image);
        let mut responses = vec![0.0f64; w * h];

        for y in margin..(h as i64 - margin) {
            for x in margin..(w as i64 - margin) {
                let mut ixx = 0.0f64;
                let mut iyy = 0.0f64;
                let mut ixy = 0.0f64;
                for by in -half_block..=half_block {
                    for bx in -half_block..=half_block {
                        let idx = ((y + by) * w as i64 + (x + bx)) as usize;
                        let dx = gx[idx] as f64;
                        let dy = gy[idx] as f64;
                        ixx += dx * dx;
                        iyy += dy * dy;
                        ixy += dx * dy;
                    }
                }
                let det = ixx * iyy - ixy * ixy;
                let trace = ixx + iyy;
                responses[(y * w as i64 + x) as usize] = det - o.k * trace * trace;
            }
        }

        let mut corners: Vec<(usize, usize, f64)> = Vec::new();
        for y in margin..(h as i64 - margin) {
            for x in margin..(w as i64 - margin) {
                let idx = (y * w as i64 + x) as usize;
                let r = responses[idx];
                if r <= o.response_threshold {
                    continue;
                }
                let mut is_max = true;
                'nms: for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nidx = ((y + dy) * w as i64 + (x + dx)) as usize;
                        if responses[nidx] > r {
                            is_max = false;
                            break 'nms;
                        }
                    }
                }
                if is_max {
                    corners.push((x as usize, y as usize, r));
                }
            }
        }

        corners.sort_by(|a, b| b.2.total_cmp(&a.2));
        corners.truncate(o.max_features);

        let mut keypoints = Vec::with_capacity(corners.len());
        for (x, y, _) in corners {
            if let Some(descriptor) = patch_descriptor(&image, x, y, o.patch_radius) {
                keypoints.push(Keypoint {
                    pt: Pt2::new(x as f64, y as f64),
                    descriptor,
                });
            }
        }
        keypoints
    }
}

/// Mean-subtracted, L2-normalized square patch around (cx, cy).
/// Returns `None` for flat patches whose norm carries no signal.
fn patch_descriptor(image: &ImageU8<'_>, cx: usize, cy: usize, radius: usize) -> Option<Vec<f32>> {
    let side = 2 * radius + 1;
    let mut patch = Vec::with_capacity(side * side);
    for y in (cy - radius)..=(cy + radius) {
        for x in (cx - radius)..=(cx + radius) {
            patch.push(image.get(x, y) as f32);
        }
    }
    let mean = patch.iter().sum::<f32>() / patch.len() as f32;
    for v in &mut patch {
        *v -= mean;
    }
    let norm = patch.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm < 1e-6 {
        return None;
    }
    for v in &mut patch {
        *v /= norm;
    }
    Some(patch)
}

fn sobel_gradients(image: &ImageU8<'_>) -> (Vec<i16>, Vec<i16>) {
    let w = image.w;
    let h = image.h;
    let mut gx = vec![0i16; w * h];
    let mut gy = vec![0i16; w * h];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let p = |dx: i64, dy: i64| {
                image.get((x as i64 + dx) as usize, (y as i64 + dy) as usize) as i32
            };
            let sx = -p(-1, -1) - 2 * p(-1, 0) - p(-1, 1) + p(1, -1) + 2 * p(1, 0) + p(1, 1);
            let sy = -p(-1, -1) - 2 * p(0, -1) - p(1, -1) + p(-1, 1) + 2 * p(0, 1) + p(1, 1);
            gx[y * w + x] = sx as i16;
            gy[y * w + x] = sy as i16;
        }
    }
    (gx, gy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::GrayImageU8;

    fn textured(w: usize, h: usize) -> GrayImageU8 {
        // Deterministic pseudo-texture; enough structure for corners.
        let mut img = GrayImageU8::zeroed(w, h);
        for y in 0..h {
            for x in 0..w {
                let v = (x.wrapping_mul(31).wrapping_add(y.wrapping_mul(17)) ^ (x * y)) % 251;
                img.set(x, y, v as u8);
            }
        }
        img
    }

    #[test]
    fn detects_corners_on_textured_image() {
        let img = textured(64, 64);
        let det = HarrisPatchDetector::default();
        let kps = det.detect(img.as_view());
        assert!(!kps.is_empty());
        let len = kps[0].descriptor.len();
        assert_eq!(len, 17 * 17);
        assert!(kps.iter().all(|k| k.descriptor.len() == len));
    }

    #[test]
    fn flat_image_yields_nothing() {
        let img = GrayImageU8::zeroed(64, 64);
        let det = HarrisPatchDetector::default();
        assert!(det.detect(img.as_view()).is_empty());
    }

    #[test]
    fn descriptors_are_normalized() {
        let img = textured(48, 48);
        let det = HarrisPatchDetector::default();
        for kp in det.detect(img.as_view()) {
            let norm: f32 = kp.descriptor.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4);
        }
    }
}
