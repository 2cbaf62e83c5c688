//! Adaptive binarization of grayscale captures.
//!
//! Approximates the Gaussian adaptive threshold of the original pipeline
//! with an integral-image local mean: a pixel becomes foreground (255) when
//! it is darker than the mean of its surrounding block minus a fixed offset.
//! Inverted output: ink is foreground.

use super::{GrayBuffer, ImageU8};

/// Block size of the local-mean window (odd).
pub const DEFAULT_BLOCK_SIZE: usize = 45;
/// Offset subtracted from the local mean before comparing.
pub const DEFAULT_OFFSET: i32 = 4;

/// Binarizes `gray` with the default block size and offset.
pub fn adaptive_threshold(gray: &ImageU8) -> GrayBuffer {
    adaptive_threshold_with(gray, DEFAULT_BLOCK_SIZE, DEFAULT_OFFSET)
}

/// Binarizes `gray` with an explicit local-mean window and offset.
pub fn adaptive_threshold_with(gray: &ImageU8, block_size: usize, offset: i32) -> GrayBuffer {
    let (w, h) = (gray.w, gray.h);
    let mut out = GrayBuffer::zeroed(w, h);
    if w == 0 || h == 0 {
        return out;
    }
    let integral = integral_image(gray);
    let half = (block_size / 2) as i64;
    for y in 0..h {
        let y0 = (y as i64 - half).max(0) as usize;
        let y1 = (y as i64 + half).min(h as i64 - 1) as usize;
        for x in 0..w {
            let x0 = (x as i64 - half).max(0) as usize;
            let x1 = (x as i64 + half).min(w as i64 - 1) as usize;
            let area = ((y1 - y0 + 1) * (x1 - x0 + 1)) as i64;
            let sum = block_sum(&integral, w, x0, y0, x1, y1);
            let mean = (sum / area) as i32;
            if (gray.get(x, y) as i32) < mean - offset {
                out.set(x, y, 255);
            }
        }
    }
    out
}

/// Summed-area table with one extra row/column of zeros.
fn integral_image(gray: &ImageU8) -> Vec<i64> {
    let (w, h) = (gray.w, gray.h);
    let iw = w + 1;
    let mut integral = vec![0i64; iw * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0i64;
        for x in 0..w {
            row_sum += gray.get(x, y) as i64;
            integral[(y + 1) * iw + x + 1] = integral[y * iw + x + 1] + row_sum;
        }
    }
    integral
}

#[inline]
fn block_sum(integral: &[i64], w: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> i64 {
    let iw = w + 1;
    integral[(y1 + 1) * iw + x1 + 1] + integral[y0 * iw + x0]
        - integral[y0 * iw + x1 + 1]
        - integral[(y1 + 1) * iw + x0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::GrayBuffer;

    #[test]
    fn dark_stroke_on_light_paper_becomes_foreground() {
        let (w, h) = (64, 64);
        let mut gray = GrayBuffer::new(w, h, vec![200u8; w * h]);
        for x in 10..50 {
            gray.set(x, 32, 20);
        }
        let bin = adaptive_threshold(&gray.as_view());
        assert_eq!(bin.get(30, 32), 255);
        assert_eq!(bin.get(30, 10), 0);
        assert_eq!(bin.get(5, 32), 0);
    }

    #[test]
    fn uniform_image_stays_background() {
        let (w, h) = (32, 32);
        let gray = GrayBuffer::new(w, h, vec![128u8; w * h]);
        let bin = adaptive_threshold(&gray.as_view());
        for y in 0..h {
            for x in 0..w {
                assert_eq!(bin.get(x, y), 0);
            }
        }
    }
}
