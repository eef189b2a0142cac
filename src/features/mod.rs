//! Feature detection seam.
//!
//! Keypoint/descriptor extraction is treated as an external capability: the
//! assembler only depends on the [`FeatureDetector`] trait. A self-contained
//! Harris-corner + normalized-patch implementation is provided so the binary
//! works out of the box; stronger detectors plug in through the same trait.

pub mod harris;

pub use harris::{HarrisPatchDetector, HarrisPatchOptions};

use crate::image::ImageU8;
use crate::types::Pt2;

/// A located feature: sub-pixel position plus a fixed-length descriptor.
///
/// Every keypoint produced by one detector invocation carries a descriptor
/// of the same length.
#[derive(Clone, Debug)]
pub struct Keypoint {
    pub pt: Pt2,
    pub descriptor: Vec<f32>,
}

/// External feature-extraction capability: `detect(image)` yields keypoints
/// with descriptors. Implementations must be deterministic for a given image.
pub trait FeatureDetector: Send + Sync {
    fn detect(&self, image: ImageU8<'_>) -> Vec<Keypoint>;
}
