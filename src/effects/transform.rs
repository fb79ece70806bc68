//! Pixel transforms
//!
//! Every function here is pure: it reads the input raster and returns a new
//! one with identical dimensions. Arithmetic runs in `i32`/`f64` and is
//! clamped back into 0..=255, so no parameter value can wrap a channel.
//! Rows are processed in parallel with rayon.

use rayon::prelude::*;

use crate::raster::{RasterImage, CHANNELS};

/// Midpoint the contrast stretch pivots around
const CONTRAST_PIVOT: f64 = 127.5;

/// Shift every channel by `delta`, clamping to 0..=255
///
/// Clamping loses information, so `brightness(brightness(img, d), -d)` is
/// not `img` wherever a channel hit 0 or 255.
pub fn brightness(img: &RasterImage, delta: i32) -> RasterImage {
    if delta == 0 {
        return img.clone();
    }

    let lut = build_lut(|c| (c as i32).saturating_add(delta).clamp(0, 255) as u8);
    apply_lut(img, &lut)
}

/// Stretch channels away from (or towards) the midpoint
///
/// `factor = 1 + delta / 100` and each channel becomes
/// `trunc((c - 127.5) * factor + 127.5)` clamped to 0..=255. Truncation is
/// toward zero, so at `delta = 100` the value 127 maps to 126 and 128 to 128.
pub fn contrast(img: &RasterImage, delta: i32) -> RasterImage {
    if delta == 0 {
        return img.clone();
    }

    let factor = 1.0 + delta as f64 / 100.0;
    let lut = build_lut(|c| {
        let stretched = (c as f64 - CONTRAST_PIVOT) * factor + CONTRAST_PIVOT;
        // `as i64` truncates toward zero and saturates on overflow
        (stretched as i64).clamp(0, 255) as u8
    });
    apply_lut(img, &lut)
}

/// Replace each `block_size` square with its per-channel floor average
///
/// Blocks along the right and bottom edges are cut off by the image border
/// and are averaged over the pixels they actually contain.
/// `block_size <= 1` returns the image unchanged.
pub fn pixelate(img: &RasterImage, block_size: i32) -> RasterImage {
    if block_size <= 1 || img.is_empty() {
        return img.clone();
    }

    let width = img.width() as usize;
    let height = img.height() as usize;
    let block = (block_size as usize).min(width.max(height));
    let stride = img.stride();
    let src = img.as_raw();
    let mut dst = vec![0u8; src.len()];

    // One chunk per band of `block` rows
    dst.par_chunks_mut(stride * block)
        .enumerate()
        .for_each(|(band, out)| {
            let y0 = band * block;
            let rows = out.len() / stride;

            for x0 in (0..width).step_by(block) {
                let cols = block.min(width - x0);
                let mut sum = [0u64; CHANNELS];

                for y in y0..y0 + rows {
                    let row = &src[y * stride..(y + 1) * stride];
                    for px in row[x0 * CHANNELS..(x0 + cols) * CHANNELS].chunks_exact(CHANNELS) {
                        sum[0] += px[0] as u64;
                        sum[1] += px[1] as u64;
                        sum[2] += px[2] as u64;
                    }
                }

                let count = (rows * cols) as u64;
                let avg = [
                    (sum[0] / count) as u8,
                    (sum[1] / count) as u8,
                    (sum[2] / count) as u8,
                ];

                for r in 0..rows {
                    let start = r * stride + x0 * CHANNELS;
                    for px in out[start..start + cols * CHANNELS].chunks_exact_mut(CHANNELS) {
                        px.copy_from_slice(&avg);
                    }
                }
            }
        });

    img.with_pixels(dst)
}

fn build_lut(f: impl Fn(u8) -> u8) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (c, slot) in lut.iter_mut().enumerate() {
        *slot = f(c as u8);
    }
    lut
}

/// Map every channel through `lut`
fn apply_lut(img: &RasterImage, lut: &[u8; 256]) -> RasterImage {
    if img.is_empty() {
        return img.clone();
    }

    let stride = img.stride();
    let src = img.as_raw();
    let mut dst = vec![0u8; src.len()];

    dst.par_chunks_mut(stride)
        .zip(src.par_chunks(stride))
        .for_each(|(row_out, row_in)| {
            for (o, i) in row_out.iter_mut().zip(row_in) {
                *o = lut[*i as usize];
            }
        });

    img.with_pixels(dst)
}
