//! Polar-line Hough transform over a binarized image.
//!
//! Resolution matches the original pipeline: 1 px in rho, 0.01 rad in
//! theta. Peaks are accumulator cells at or above the vote threshold that
//! are local maxima against their four neighbors. The vote threshold is
//! the sensitivity knob cycled by the retry controller.

use crate::geometry::Line;
use crate::image::ImageU8;

/// Theta resolution of the accumulator (radians).
pub const THETA_RESOLUTION: f32 = 0.01;
/// Frames producing more candidate lines than this are considered noise
/// and yield no lines at all.
pub const MAX_LINES: usize = 500;

/// Detects lines with at least `threshold` supporting foreground pixels.
///
/// The result is sorted by ascending theta, as the axis clustering expects.
pub fn detect_lines(image: &ImageU8, threshold: u32) -> Vec<Line> {
    let num_theta = (std::f32::consts::PI / THETA_RESOLUTION).ceil() as usize;
    let diagonal = ((image.w * image.w + image.h * image.h) as f32).sqrt().ceil() as i32;
    let num_rho = (2 * diagonal + 1) as usize;

    let tables: Vec<(f32, f32)> = (0..num_theta)
        .map(|t| {
            let theta = t as f32 * THETA_RESOLUTION;
            (theta.cos(), theta.sin())
        })
        .collect();

    let mut accumulator = vec![0u32; num_theta * num_rho];
    for y in 0..image.h {
        for x in 0..image.w {
            if image.get(x, y) == 0 {
                continue;
            }
            for (t, &(cos_t, sin_t)) in tables.iter().enumerate() {
                let rho = x as f32 * cos_t + y as f32 * sin_t;
                let r = (rho.round() as i32 + diagonal) as usize;
                accumulator[t * num_rho + r] += 1;
            }
        }
    }

    let mut lines = Vec::new();
    for t in 0..num_theta {
        for r in 0..num_rho {
            let votes = accumulator[t * num_rho + r];
            if votes < threshold {
                continue;
            }
            if !is_local_maximum(&accumulator, num_theta, num_rho, t, r) {
                continue;
            }
            let rho = (r as i32 - diagonal) as f32;
            let theta = t as f32 * THETA_RESOLUTION;
            lines.push(Line::new(rho, theta));
        }
    }
    if lines.len() > MAX_LINES {
        return Vec::new();
    }
    lines.sort_by(|a, b| a.theta.total_cmp(&b.theta));
    lines
}

/// Strict against the previous neighbor, non-strict against the next one,
/// so plateau peaks survive exactly once.
fn is_local_maximum(acc: &[u32], num_theta: usize, num_rho: usize, t: usize, r: usize) -> bool {
    let votes = acc[t * num_rho + r];
    if r > 0 && acc[t * num_rho + r - 1] >= votes {
        return false;
    }
    if r + 1 < num_rho && acc[t * num_rho + r + 1] > votes {
        return false;
    }
    if t > 0 && acc[(t - 1) * num_rho + r] >= votes {
        return false;
    }
    if t + 1 < num_theta && acc[(t + 1) * num_rho + r] > votes {
        return false;
    }
    true
}
