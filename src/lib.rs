#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod anchor;
pub mod assembler;
pub mod error;
pub mod estimate;
pub mod features;
pub mod image;
pub mod matching;
pub mod transform;
pub mod types;
pub mod warp;

// Tool-facing helpers.
pub mod config;

// --- High-level re-exports -------------------------------------------------

// Main entry points: the controller + its tunables and report.
pub use crate::assembler::{AssemblyParams, MosaicAssembler, Piece};
pub use crate::error::AssemblyError;
pub use crate::types::{AssemblyReport, AssemblyState};

// The pieces the controller is built from, useful on their own.
pub use crate::estimate::{estimate_transform, ModelFamily, RansacOptions, RansacResult};
pub use crate::matching::{match_features, Correspondence, MatcherOptions};
pub use crate::transform::Transform;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
pub mod prelude {
    pub use crate::features::{FeatureDetector, HarrisPatchDetector, Keypoint};
    pub use crate::image::GrayImageU8;
    pub use crate::{
        AssemblyParams, AssemblyReport, AssemblyState, ModelFamily, MosaicAssembler, Transform,
    };
}
