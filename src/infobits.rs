//! Sheet-model info-bits: sampling the bit circles printed under each
//! answer table and the redundant code that maps them to a model letter.
//!
//! Every column carries one bit as a pair of stacked circles below the
//! bottom table line; exactly one circle of the pair is filled. The bit
//! stream repeats a 4-bit group (three payload bits plus a parity bit), so
//! a misread almost always breaks either the pair rule or the repetition.

use crate::geometry::Point;
use crate::grid::CornerMatrix;
use crate::image::ImageU8;
use log::debug;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Sampling parameters of the info-bit circles.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct InfobitParams {
    /// Circle foreground fraction at which a circle counts as filled.
    pub threshold: f32,
    /// Circle radius as a fraction of the cell row height.
    pub radius_multiplier: f32,
}

impl Default for InfobitParams {
    fn default() -> Self {
        Self {
            threshold: 0.25,
            radius_multiplier: 0.333,
        }
    }
}

/// Reads one info-bit per answer column, left to right, table by table.
///
/// Returns `None` when any bit pair is inconsistent (both circles filled,
/// or neither).
pub fn read_infobits(
    image: &ImageU8,
    matrices: &[CornerMatrix],
    params: &InfobitParams,
) -> Option<Vec<bool>> {
    let mut pairs = Vec::new();
    for matrix in matrices {
        let rows = matrix.num_rows();
        if rows < 2 {
            return None;
        }
        for i in 1..matrix.num_cols() {
            let bottom_prev = matrix.at(rows - 1, i - 1).to_vec();
            let bottom = matrix.at(rows - 1, i).to_vec();
            let above = matrix.at(rows - 2, i).to_vec();
            let dx = bottom_prev - bottom;
            let dy = bottom - above;
            let center_up = Point::from_vec(bottom + dx / 2.0 + dy / 2.6);
            pairs.push(read_bit_pair(image, center_up, dy, params));
        }
    }
    for (i, &(up, down)) in pairs.iter().enumerate() {
        if up == down {
            debug!("infobits: inconsistent circle pair at column {i}");
            return None;
        }
    }
    Some(pairs.into_iter().map(|(up, _)| up).collect())
}

fn read_bit_pair(
    image: &ImageU8,
    center_up: Point,
    dy: Vector2<f32>,
    params: &InfobitParams,
) -> (bool, bool) {
    let center_down = Point::from_vec(center_up.to_vec() + dy);
    let radius = ((dy.norm() * params.radius_multiplier).round() as i32).max(1);
    (
        circle_fraction(image, center_up, radius) >= params.threshold,
        circle_fraction(image, center_down, radius) >= params.threshold,
    )
}

/// Foreground fraction inside a filled circle; out-of-bounds pixels count
/// as background.
fn circle_fraction(image: &ImageU8, center: Point, radius: i32) -> f32 {
    let mut total = 0u32;
    let mut set = 0u32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            total += 1;
            if image.fg(Point::new(center.x + dx, center.y + dy)) {
                set += 1;
            }
        }
    }
    if total == 0 {
        return 0.0;
    }
    set as f32 / total as f32
}

/// Highest model letter the 3-bit payload can encode.
pub const MAX_MODEL: char = 'H';

/// Encodes a model letter as the bit stream for `num_bits` columns.
///
/// `None` for letters outside `'A'..='H'` or fewer than four columns.
pub fn encode_model(model: char, num_bits: usize) -> Option<Vec<bool>> {
    if !model.is_ascii_uppercase() || model > MAX_MODEL || num_bits < 4 {
        return None;
    }
    let num = model as u8 - b'A';
    let b0 = num & 1 != 0;
    let b1 = num & 2 != 0;
    let b2 = num & 4 != 0;
    let group = [b0, b1, b2, b0 ^ b1 ^ !b2];
    Some((0..num_bits).map(|i| group[i % 4]).collect())
}

/// Decodes a bit stream back into the model letter.
///
/// An all-false stream decodes to the reserved model `'0'` only when
/// `accept_model_0` is set; otherwise, and on any parity or repetition
/// violation, the result is `None`.
pub fn decode_model(bits: &[bool], accept_model_0: bool) -> Option<char> {
    if bits.len() < 4 {
        return None;
    }
    if bits.iter().all(|&b| !b) {
        return accept_model_0.then_some('0');
    }
    let group = &bits[..4];
    if group[3] != group[0] ^ group[1] ^ !group[2] {
        return None;
    }
    if bits.iter().enumerate().any(|(i, &b)| b != group[i % 4]) {
        return None;
    }
    let num = group[0] as u8 + 2 * (group[1] as u8) + 4 * (group[2] as u8);
    Some((b'A' + num) as char)
}
