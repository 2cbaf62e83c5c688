//! Stroke-crossing profiles: how many ink runs a probe line meets and
//! where, plus the coarse region signature built from them.

use crate::geometry::{self, Point};
use crate::image::ImageU8;

/// One ink run met while walking a probe line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Crossing {
    /// Run start, relative to the probe length.
    pub begin_rel: f32,
    /// Run end, relative to the probe length.
    pub end_rel: f32,
    /// Run center, relative to the probe length.
    pub center_rel: f32,
    /// Run length in pixels.
    pub length: usize,
    /// Position of the probe line across the cell, in `[0, 1]`.
    pub offset: f32,
}

/// Walks a probe line and extracts its ink runs.
///
/// Single-pixel gaps and spikes are smoothed away first; runs of a single
/// pixel are ignored.
pub fn scan_crossings(image: &ImageU8, p0: Point, p1: Point, offset: f32) -> Vec<Crossing> {
    let mut pixels: Vec<bool> = geometry::walk_line(p0, p1).map(|p| image.fg(p)).collect();
    for i in 1..pixels.len().saturating_sub(1) {
        if !pixels[i - 1] && !pixels[i + 1] {
            pixels[i] = false;
        } else if pixels[i - 1] && pixels[i + 1] {
            pixels[i] = true;
        }
    }
    let n = pixels.len();
    let mut crossings = Vec::new();
    let mut begin: Option<usize> = None;
    for (i, &value) in pixels.iter().enumerate() {
        match begin {
            None => {
                if value {
                    begin = Some(i);
                }
            }
            Some(b) => {
                if !value || i == n - 1 {
                    let end = if value { i } else { i - 1 };
                    if end > b {
                        crossings.push(Crossing {
                            begin_rel: b as f32 / n as f32,
                            end_rel: end as f32 / n as f32,
                            center_rel: (b + end) as f32 / (2 * n) as f32,
                            length: end - b + 1,
                            offset,
                        });
                    }
                    begin = None;
                }
            }
        }
    }
    crossings
}

/// Drops empty probe rows at both ends of the profile, plus isolated short
/// runs that are border noise rather than digit strokes.
pub fn trim_empty_rows(rows: Vec<Vec<Crossing>>) -> Vec<Vec<Crossing>> {
    if rows.is_empty() {
        return rows;
    }
    let mut begin = None;
    let mut end = 0;
    for (i, row) in rows.iter().enumerate() {
        if !row.is_empty() {
            end = i + 1;
            if begin.is_none() {
                begin = Some(i);
            }
        }
    }
    let Some(mut begin) = begin else {
        return Vec::new();
    };
    // A lone short run separated from the rest is ink bleeding in from the
    // cell border.
    if (rows[begin].len() == 1
        && end - begin > 1
        && rows[begin + 1].is_empty()
        && rows[begin][0].length < 6)
        || (end - begin > 2 && rows[begin + 1].is_empty() && rows[begin + 2].is_empty())
    {
        begin += 1;
        while begin < end && rows[begin].is_empty() {
            begin += 1;
        }
    }
    if (rows[end - 1].len() == 1
        && end >= 2
        && rows[end - 2].is_empty()
        && rows[end - 1][0].length < 6)
        || (end >= 3 && rows[end - 2].is_empty() && rows[end - 3].is_empty())
    {
        end -= 1;
        while end >= 1 && rows[end - 1].is_empty() {
            end -= 1;
        }
    }
    if begin >= end {
        return Vec::new();
    }
    rows[begin..end].to_vec()
}

/// Region signatures of both profiles.
///
/// The occupied span of the digit is split into three regions along the
/// probe direction; each row becomes a three-character particle marking
/// which regions its runs touch, and the particles are joined with `/`.
/// Narrow isolated runs that only graze the outer regions skip the middle
/// mark.
pub fn signatures(hcrossings: &[Vec<Crossing>], vcrossings: &[Vec<Crossing>]) -> (String, String) {
    let min_length = hcrossings
        .iter()
        .chain(vcrossings.iter())
        .flat_map(|row| row.iter().map(|c| c.length))
        .min()
        .unwrap_or(1);
    let width_threshold = (3 * min_length) as f32;
    let min_v = hcrossings[0][0].offset;
    let max_v = hcrossings[hcrossings.len() - 1][0].offset;
    let min_h = vcrossings[0][0].offset;
    let max_h = vcrossings[vcrossings.len() - 1][0].offset;

    let hsig = signature_of(hcrossings, min_h, max_h, width_threshold);
    let vsig = signature_of(vcrossings, min_v, max_v, width_threshold);
    (hsig, vsig)
}

fn signature_of(
    rows: &[Vec<Crossing>],
    min_pos: f32,
    max_pos: f32,
    width_threshold: f32,
) -> String {
    let region_width = ((max_pos - min_pos) / 3.0).max(0.1);
    let limits = (max_pos - 2.0 * region_width, max_pos - region_width);
    let mut particles = vec![String::new()];
    for row in rows {
        let mut mark = [false; 3];
        for c in row {
            let mut m = [
                c.begin_rel < limits.0,
                c.begin_rel < limits.1 && c.end_rel >= limits.0,
                c.end_rel >= limits.1,
            ];
            if row.len() <= 2
                && (c.length as f32) <= width_threshold
                && c.end_rel - c.begin_rel < region_width
                && (c.begin_rel < limits.0 || c.end_rel >= limits.1)
            {
                m[1] = false;
            }
            for i in 0..3 {
                mark[i] |= m[i];
            }
        }
        particles.push(mark.iter().map(|&b| if b { 'X' } else { '_' }).collect());
    }
    particles.push(String::new());
    particles.join("/")
}
