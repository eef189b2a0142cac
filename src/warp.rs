//! Resampling a piece into canvas coordinates.
//!
//! Warping is inverse-mapped: every output pixel is traced back through the
//! inverse transform and sampled from the source with bicubic interpolation.
//! Output pixels whose source location falls outside the source bounds are
//! background (zero), never clamped to the border — the merge step treats
//! "non-zero" as its commit predicate, so clamping would smear edge pixels
//! across the canvas.

use rayon::prelude::*;

use crate::error::AssemblyError;
use crate::image::GrayImageU8;
use crate::transform::Transform;
use crate::types::Pt2;

/// Warp `src` through `transform` (source -> output coordinates) into a new
/// `out_w` × `out_h` buffer.
pub fn warp(
    src: &GrayImageU8,
    transform: &Transform,
    out_w: usize,
    out_h: usize,
) -> Result<GrayImageU8, AssemblyError> {
    let inverse = transform
        .invert()
        .ok_or(AssemblyError::NonInvertibleTransform)?;

    let mut data = vec![0u8; out_w * out_h];
    data.par_chunks_mut(out_w).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            let Some(p) = inverse.apply_point(Pt2::new(x as f64, y as f64)) else {
                continue; // w ~ 0: undefined preimage stays background
            };
            *out = sample_bicubic(src, p.x, p.y);
        }
    });

    Ok(GrayImageU8::new(out_w, out_h, data))
}

/// Bicubic (Catmull-Rom) sample at a real-valued source location.
/// Returns background zero when the location itself is out of bounds;
/// border-adjacent taps beyond the image contribute zero.
fn sample_bicubic(src: &GrayImageU8, x: f64, y: f64) -> u8 {
    // Tolerance for the bounds test only: estimated transforms carry
    // floating-point noise, and a boundary location off by one ulp must not
    // zero the whole pixel. Locations inside the band are sampled as usual;
    // the per-tap guards below already treat beyond-edge taps as zero.
    const BOUNDS_EPS: f64 = 1e-6;
    let w = src.width();
    let h = src.height();
    if x < -BOUNDS_EPS
        || y < -BOUNDS_EPS
        || x > (w - 1) as f64 + BOUNDS_EPS
        || y > (h - 1) as f64 + BOUNDS_EPS
    {
        return 0;
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let wx = [
        cubic_weight(1.0 + fx),
        cubic_weight(fx),
        cubic_weight(1.0 - fx),
        cubic_weight(2.0 - fx),
    ];
    let wy = [
        cubic_weight(1.0 + fy),
        cubic_weight(fy),
        cubic_weight(1.0 - fy),
        cubic_weight(2.0 - fy),
    ];

    let mut acc = 0.0f64;
    for (j, &wyj) in wy.iter().enumerate() {
        let sy = y0 - 1 + j as i64;
        if sy < 0 || sy >= h as i64 {
            continue;
        }
        for (i, &wxi) in wx.iter().enumerate() {
            let sx = x0 - 1 + i as i64;
            if sx < 0 || sx >= w as i64 {
                continue;
            }
            acc += wxi * wyj * src.get(sx as usize, sy as usize) as f64;
        }
    }
    acc.round().clamp(0.0, 255.0) as u8
}

/// Catmull-Rom kernel (a = -0.5), evaluated at |t|.
fn cubic_weight(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        1.5 * t * t * t - 2.5 * t * t + 1.0
    } else if t < 2.0 {
        -0.5 * t * t * t + 2.5 * t * t - 4.0 * t + 2.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix2, Vector2};

    fn ramp(w: usize, h: usize) -> GrayImageU8 {
        let mut img = GrayImageU8::zeroed(w, h);
        for y in 0..h {
            for x in 0..w {
                img.set(x, y, (20 + 7 * x + 11 * y) as u8);
            }
        }
        img
    }

    #[test]
    fn identity_warp_preserves_pixels() {
        let src = ramp(12, 9);
        let out = warp(&src, &Transform::identity_affine(), 12, 9).unwrap();
        assert_eq!(out.pixels(), src.pixels());
    }

    #[test]
    fn integer_translation_shifts_content() {
        let src = ramp(10, 8);
        let t = Transform::Affine {
            a: Matrix2::identity(),
            t: Vector2::new(3.0, 2.0),
        };
        let out = warp(&src, &t, 20, 16).unwrap();
        for y in 0..8 {
            for x in 0..10 {
                assert_eq!(out.get(x + 3, y + 2), src.get(x, y));
            }
        }
        // Outside the mapped footprint stays background.
        assert_eq!(out.get(0, 0), 0);
        assert_eq!(out.get(19, 15), 0);
    }

    #[test]
    fn out_of_bounds_source_is_background_not_clamped() {
        let mut src = GrayImageU8::zeroed(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                src.set(x, y, 255);
            }
        }
        // Shift right/down by 6: the entire source lands at x,y >= 6.
        let t = Transform::Affine {
            a: Matrix2::identity(),
            t: Vector2::new(6.0, 6.0),
        };
        let out = warp(&src, &t, 12, 12).unwrap();
        for y in 0..6 {
            for x in 0..12 {
                assert_eq!(out.get(x, y), 0, "row {y} should be background");
            }
        }
        assert_eq!(out.get(6, 6), 255);
    }

    #[test]
    fn singular_transform_is_rejected() {
        let src = ramp(5, 5);
        let t = Transform::Affine {
            a: Matrix2::new(1.0, 2.0, 2.0, 4.0),
            t: Vector2::zeros(),
        };
        assert!(matches!(
            warp(&src, &t, 5, 5),
            Err(AssemblyError::NonInvertibleTransform)
        ));
    }
}
