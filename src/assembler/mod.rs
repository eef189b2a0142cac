//! Greedy incremental assembly of deformed fragments into one mosaic.
//!
//! Overview
//! - The canvas is seeded once by warping an externally designated anchor
//!   piece through its trusted transform.
//! - Each round the current canvas is re-featurized, every pending piece is
//!   matched and robustly fitted against it, and the piece with the most
//!   RANSAC inliers is warped and merged (non-background overwrites).
//! - The loop terminates when no pieces remain (DONE) or a full round
//!   qualifies none of them (STUCK); a stuck run still reports the partial
//!   canvas and the unplaced pieces.
//!
//! There is no backtracking: committing the most confidently aligned piece
//! first limits compounding misalignment, but an early wrong commit is
//! permanent.
//!
//! Modules
//! - [`options`] — run tunables shared by the library API and the CLI.
//! - `pipeline` — the [`MosaicAssembler`] implementation.

pub mod options;
mod pipeline;

pub use options::AssemblyParams;
pub use pipeline::{MosaicAssembler, Piece};
