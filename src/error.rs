use std::path::PathBuf;
use thiserror::Error;

/// Failure conditions surfaced by the assembly pipeline.
///
/// Per-candidate conditions (`InsufficientFeatures`,
/// `InsufficientCorrespondences`, `NoQualifyingModel`) are recovered inside
/// the round loop; only startup failures such as
/// `MalformedAnchorTransform` abort a run.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("feature set is empty on one side of the match")]
    InsufficientFeatures,

    #[error("only {found} correspondences, model needs {needed}")]
    InsufficientCorrespondences { found: usize, needed: usize },

    #[error("no model reached the inlier floor within the iteration budget")]
    NoQualifyingModel,

    #[error("transform is not invertible")]
    NonInvertibleTransform,

    #[error("malformed anchor transform {path}: {reason}")]
    MalformedAnchorTransform { path: PathBuf, reason: String },

    #[error("anchor piece was already placed")]
    AnchorAlreadyPlaced,

    #[error("run requires a seeded anchor")]
    AnchorMissing,
}
