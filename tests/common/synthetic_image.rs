use mosaic_assembler::image::GrayImageU8;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Deterministic high-frequency texture. Pixel values stay in 1..=255 so the
/// scene never contains background (zero) pixels and merge coverage is exact.
pub fn textured_scene(width: usize, height: usize, seed: u64) -> GrayImageU8 {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; width * height];
    for px in &mut data {
        *px = rng.random_range(1..=255u8);
    }
    GrayImageU8::new(width, height, data)
}

/// Axis-aligned crop; the true placement transform of the crop is the
/// translation by `(x0, y0)`.
pub fn crop(src: &GrayImageU8, x0: usize, y0: usize, width: usize, height: usize) -> GrayImageU8 {
    assert!(x0 + width <= src.width() && y0 + height <= src.height());
    let mut out = GrayImageU8::zeroed(width, height);
    for y in 0..height {
        for x in 0..width {
            out.set(x, y, src.get(x0 + x, y0 + y));
        }
    }
    out
}

/// Mean absolute per-pixel difference over the full buffer.
pub fn mean_abs_diff(a: &GrayImageU8, b: &GrayImageU8) -> f64 {
    assert_eq!(a.width(), b.width());
    assert_eq!(a.height(), b.height());
    let sum: f64 = a
        .pixels()
        .iter()
        .zip(b.pixels())
        .map(|(&pa, &pb)| (pa as f64 - pb as f64).abs())
        .sum();
    sum / a.pixels().len() as f64
}
