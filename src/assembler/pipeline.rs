//! The greedy assembly loop.
//!
//! The assembler owns the canvas and the pending-piece set. Every round it
//! re-extracts features from the current canvas (the mosaic grows, so later
//! pieces must align against everything placed so far, not against any single
//! neighbour), scores every pending piece with matcher + RANSAC, commits the
//! piece with the most inliers, and repeats until the pending set is empty
//! (DONE) or a whole round qualifies nothing (STUCK).
//!
//! Scoring is read-only over an immutable snapshot of the round's canvas
//! features, so pieces are scored in parallel; all mutation (merge, removal)
//! happens after the winner is chosen.

use std::collections::BTreeMap;
use std::time::Instant;

use log::debug;
use rayon::prelude::*;

use crate::error::AssemblyError;
use crate::estimate::estimate_transform;
use crate::features::{FeatureDetector, Keypoint};
use crate::image::{GrayImageU8, ImageView, ImageViewMut};
use crate::matching::match_features;
use crate::transform::Transform;
use crate::types::{AssemblyReport, AssemblyState, PlacementRecord, Pt2, UnplacedPiece};
use crate::warp::warp;

use super::options::AssemblyParams;

/// A pending fragment: image plus features extracted exactly once at load
/// time, before any warping. Placement consumes the piece; warped pixels are
/// never re-featurized.
pub struct Piece {
    id: usize,
    name: String,
    image: GrayImageU8,
    keypoints: Vec<Keypoint>,
}

impl Piece {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keypoint_count(&self) -> usize {
        self.keypoints.len()
    }
}

struct Candidate {
    piece_id: usize,
    inlier_count: usize,
    transform: Transform,
}

pub struct MosaicAssembler {
    params: AssemblyParams,
    detector: Box<dyn FeatureDetector>,
    canvas: GrayImageU8,
    /// Per-pixel placement counter. Diagnostic only, never drives selection.
    coverage: Vec<u16>,
    pending: BTreeMap<usize, Piece>,
    placements: Vec<PlacementRecord>,
    state: AssemblyState,
    rounds: usize,
    next_id: usize,
}

impl MosaicAssembler {
    /// Create an assembler with an empty (all-background) canvas.
    pub fn new(
        params: AssemblyParams,
        detector: Box<dyn FeatureDetector>,
        canvas_width: usize,
        canvas_height: usize,
    ) -> Self {
        Self {
            params,
            detector,
            canvas: GrayImageU8::zeroed(canvas_width, canvas_height),
            coverage: vec![0u16; canvas_width * canvas_height],
            pending: BTreeMap::new(),
            placements: Vec::new(),
            state: AssemblyState::Initial,
            rounds: 0,
            next_id: 0,
        }
    }

    /// Register a pending piece. Features are computed here, once.
    pub fn add_piece(&mut self, name: impl Into<String>, image: GrayImageU8) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        let keypoints = self.detector.detect(image.as_view());
        let name = name.into();
        debug!("piece {id} ({name}): {} keypoints", keypoints.len());
        self.pending.insert(
            id,
            Piece {
                id,
                name,
                image,
                keypoints,
            },
        );
        id
    }

    /// Seed the canvas by warping the anchor piece through its externally
    /// supplied, trusted transform. Must happen exactly once, before `run`.
    pub fn seed_anchor(
        &mut self,
        image: &GrayImageU8,
        transform: &Transform,
    ) -> Result<(), AssemblyError> {
        if self.state != AssemblyState::Initial {
            return Err(AssemblyError::AnchorAlreadyPlaced);
        }
        let warped = warp(image, transform, self.canvas.width(), self.canvas.height())?;
        self.merge(&warped);
        debug!("anchor placed, coverage={:.3}", self.coverage_fraction());
        self.state = AssemblyState::Iterating;
        Ok(())
    }

    /// Run rounds until DONE or STUCK and return the report.
    pub fn run(&mut self) -> Result<AssemblyReport, AssemblyError> {
        if self.state == AssemblyState::Initial {
            return Err(AssemblyError::AnchorMissing);
        }
        let start = Instant::now();
        while self.state == AssemblyState::Iterating {
            if self.pending.is_empty() {
                self.state = AssemblyState::Done;
                break;
            }
            self.run_round()?;
        }
        Ok(self.report(start.elapsed().as_secs_f64() * 1000.0))
    }

    fn run_round(&mut self) -> Result<(), AssemblyError> {
        self.rounds += 1;
        let canvas_keypoints = self.detector.detect(self.canvas.as_view());
        debug!(
            "round {}: canvas keypoints={} pending={}",
            self.rounds,
            canvas_keypoints.len(),
            self.pending.len()
        );

        // Immutable snapshot in ascending-id order; scoring is read-only.
        let pieces: Vec<&Piece> = self.pending.values().collect();
        let candidates: Vec<Option<Candidate>> = pieces
            .par_iter()
            .map(
                |piece| match self.score_piece(&canvas_keypoints, piece) {
                    Ok(candidate) => Some(candidate),
                    Err(e) => {
                        debug!("piece {} skipped this round: {e}", piece.id);
                        None
                    }
                },
            )
            .collect();

        // Strictly-greater comparison keeps the first-encountered piece in
        // the fixed scan order on ties.
        let mut best: Option<Candidate> = None;
        for candidate in candidates.into_iter().flatten() {
            let better = best
                .as_ref()
                .map_or(true, |b| candidate.inlier_count > b.inlier_count);
            if better {
                best = Some(candidate);
            }
        }

        match best {
            Some(winner) => self.commit(winner),
            None => {
                debug!("round {}: no qualifying piece, stuck", self.rounds);
                self.state = AssemblyState::Stuck;
                Ok(())
            }
        }
    }

    /// Score one pending piece against the round's canvas features: ratio
    /// test, then RANSAC fitting piece -> canvas coordinates. Any local
    /// failure (no features, too few correspondences, no qualifying model,
    /// non-invertible fit) skips the piece for this round.
    fn score_piece(
        &self,
        canvas_keypoints: &[Keypoint],
        piece: &Piece,
    ) -> Result<Candidate, AssemblyError> {
        let matches = match_features(
            canvas_keypoints,
            &piece.keypoints,
            &self.params.matcher_options(),
        )?;
        let needed = self.params.model.min_samples();
        if matches.len() < needed {
            return Err(AssemblyError::InsufficientCorrespondences {
                found: matches.len(),
                needed,
            });
        }

        let (src, dst): (Vec<Pt2>, Vec<Pt2>) = matches
            .iter()
            .map(|c| (piece.keypoints[c.piece_idx].pt, canvas_keypoints[c.mosaic_idx].pt))
            .unzip();

        let opts = self.params.ransac_options(piece.id);
        let result = estimate_transform(self.params.model, &src, &dst, &opts);
        let transform = result.model.ok_or(AssemblyError::NoQualifyingModel)?;
        // A fit that cannot be inverted cannot be warped.
        if transform.invert().is_none() {
            return Err(AssemblyError::NonInvertibleTransform);
        }
        debug!(
            "piece {}: {} inliers of {} correspondences",
            piece.id,
            result.inlier_count,
            matches.len()
        );
        Ok(Candidate {
            piece_id: piece.id,
            inlier_count: result.inlier_count,
            transform,
        })
    }

    fn commit(&mut self, winner: Candidate) -> Result<(), AssemblyError> {
        // Removal drops the piece's cached features with it.
        let piece = self
            .pending
            .remove(&winner.piece_id)
            .expect("winner must be pending");
        let warped = warp(
            &piece.image,
            &winner.transform,
            self.canvas.width(),
            self.canvas.height(),
        )?;
        self.merge(&warped);
        let coverage = self.coverage_fraction();
        debug!(
            "round {}: placed piece {} ({}) inliers={} coverage={:.3}",
            self.rounds, piece.id, piece.name, winner.inlier_count, coverage
        );
        self.placements.push(PlacementRecord {
            round: self.rounds,
            piece_id: piece.id,
            piece_name: piece.name,
            inlier_count: winner.inlier_count,
            transform: winner.transform,
            coverage,
        });
        Ok(())
    }

    /// Last-writer-wins merge: every non-background pixel of the warped
    /// piece overwrites the canvas. No blending.
    fn merge(&mut self, warped: &GrayImageU8) {
        let width = self.canvas.width();
        for y in 0..self.canvas.height() {
            let src = ImageView::row(warped, y);
            let cov = &mut self.coverage[y * width..(y + 1) * width];
            let dst = self.canvas.row_mut(y);
            for ((d, c), &s) in dst.iter_mut().zip(cov).zip(src) {
                if s != 0 {
                    *d = s;
                    *c += 1;
                }
            }
        }
    }

    fn coverage_fraction(&self) -> f32 {
        let covered = self.coverage.iter().filter(|&&c| c > 0).count();
        covered as f32 / self.coverage.len() as f32
    }

    fn report(&self, latency_ms: f64) -> AssemblyReport {
        AssemblyReport {
            state: self.state,
            rounds: self.rounds,
            placements: self.placements.clone(),
            unplaced: self
                .pending
                .values()
                .map(|p| UnplacedPiece {
                    piece_id: p.id,
                    piece_name: p.name.clone(),
                })
                .collect(),
            coverage: self.coverage_fraction(),
            latency_ms,
        }
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn canvas(&self) -> &GrayImageU8 {
        &self.canvas
    }

    pub fn into_canvas(self) -> GrayImageU8 {
        self.canvas
    }
}
