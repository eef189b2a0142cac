mod common;

use common::synthetic_image::{crop, textured_scene};
use mosaic_assembler::features::{HarrisPatchDetector, HarrisPatchOptions};
use mosaic_assembler::{AssemblyError, AssemblyParams, AssemblyState, MosaicAssembler, Transform};

fn detector() -> Box<HarrisPatchDetector> {
    Box::new(HarrisPatchDetector::new(HarrisPatchOptions {
        max_features: 200,
        patch_radius: 5,
        ..Default::default()
    }))
}

#[test]
fn run_requires_a_seeded_anchor() {
    let mut asm = MosaicAssembler::new(AssemblyParams::default(), detector(), 64, 64);
    assert!(matches!(asm.run(), Err(AssemblyError::AnchorMissing)));
    assert_eq!(asm.state(), AssemblyState::Initial);
}

#[test]
fn anchor_is_seeded_exactly_once() {
    let scene = textured_scene(64, 64, 3);
    let mut asm = MosaicAssembler::new(AssemblyParams::default(), detector(), 64, 64);
    asm.seed_anchor(&scene, &Transform::identity_affine())
        .expect("first anchor");
    let err = asm
        .seed_anchor(&scene, &Transform::identity_affine())
        .unwrap_err();
    assert!(matches!(err, AssemblyError::AnchorAlreadyPlaced));
}

#[test]
fn empty_pending_set_finishes_without_rounds() {
    let scene = textured_scene(64, 64, 3);
    let mut asm = MosaicAssembler::new(AssemblyParams::default(), detector(), 64, 64);
    asm.seed_anchor(&scene, &Transform::identity_affine())
        .expect("anchor placement");
    let report = asm.run().expect("run");
    assert_eq!(report.state, AssemblyState::Done);
    assert_eq!(report.rounds, 0);
    assert!(report.placements.is_empty());
    assert!(report.unplaced.is_empty());
    assert!((report.coverage - 1.0).abs() < 1e-6);
}

#[test]
fn placed_piece_leaves_the_pending_set() {
    let scene = textured_scene(120, 90, 8);
    let anchor = crop(&scene, 0, 0, 80, 90);
    let piece = crop(&scene, 40, 0, 80, 90);

    let mut asm = MosaicAssembler::new(AssemblyParams::default(), detector(), 120, 90);
    asm.seed_anchor(&anchor, &Transform::identity_affine())
        .expect("anchor placement");
    asm.add_piece("right", piece);
    assert_eq!(asm.pending_count(), 1);

    let report = asm.run().expect("run");
    assert_eq!(asm.pending_count(), 0);
    assert_eq!(report.placements.len(), 1);
    assert_eq!(report.placements[0].round, 1);
    assert_eq!(report.placements[0].piece_name, "right");
}
