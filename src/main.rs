use mosaic_assembler::features::HarrisPatchDetector;
use mosaic_assembler::image::GrayImageU8;
use mosaic_assembler::{AssemblyParams, MosaicAssembler, Transform};

fn main() {
    // Demo stub: slice a synthetic textured image into two overlapping
    // fragments and reassemble them.
    let (w, h) = (160usize, 120usize);
    let mut reference = GrayImageU8::zeroed(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = (x.wrapping_mul(37) ^ y.wrapping_mul(73)).wrapping_add(x * y) % 256;
            reference.set(x, y, v as u8);
        }
    }

    let crop = |x0: usize, y0: usize, cw: usize, ch: usize| {
        let mut out = GrayImageU8::zeroed(cw, ch);
        for y in 0..ch {
            for x in 0..cw {
                out.set(x, y, reference.get(x0 + x, y0 + y));
            }
        }
        out
    };

    let anchor = crop(0, 0, 100, 120);
    let piece = crop(60, 0, 100, 120);

    let mut asm = MosaicAssembler::new(
        AssemblyParams::default(),
        Box::new(HarrisPatchDetector::default()),
        w,
        h,
    );
    asm.seed_anchor(&anchor, &Transform::identity_affine())
        .expect("anchor placement");
    asm.add_piece("right_half", piece);

    let report = asm.run().expect("assembly run");
    println!(
        "state={:?} rounds={} coverage={:.3} latency_ms={:.3}",
        report.state, report.rounds, report.coverage, report.latency_ms
    );
}
