use serde::Serialize;

use crate::transform::Transform;

/// 2-D point in canvas/piece pixel coordinates.
pub type Pt2 = nalgebra::Point2<f64>;

/// Controller states, including the two terminal outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AssemblyState {
    /// Canvas exists but the anchor has not been merged yet.
    Initial,
    /// Anchor placed, pending pieces remain.
    Iterating,
    /// Every piece was placed.
    Done,
    /// A full round produced no qualifying candidate; remaining pieces stay
    /// unplaced. Terminal but not an error.
    Stuck,
}

/// One committed placement.
#[derive(Clone, Debug, Serialize)]
pub struct PlacementRecord {
    pub round: usize,
    pub piece_id: usize,
    pub piece_name: String,
    pub inlier_count: usize,
    pub transform: Transform,
    /// Fraction of canvas pixels covered after this merge. Diagnostic only.
    pub coverage: f32,
}

/// Identity of a piece that was never placed.
#[derive(Clone, Debug, Serialize)]
pub struct UnplacedPiece {
    pub piece_id: usize,
    pub piece_name: String,
}

/// Summary of a full assembly run.
#[derive(Clone, Debug, Serialize)]
pub struct AssemblyReport {
    pub state: AssemblyState,
    pub rounds: usize,
    pub placements: Vec<PlacementRecord>,
    pub unplaced: Vec<UnplacedPiece>,
    pub coverage: f32,
    pub latency_ms: f64,
}
