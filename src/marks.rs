//! Per-cell mark classification and per-question aggregation.
//!
//! A bubble is tested with two concentric cross-shaped masks laid over its
//! diagonals: a provisional "marked" verdict from the foreground fraction
//! inside the mask, then a whole-cell counter-check that tells a deliberate
//! cross apart from an entirely dark cell (heavy shading, scanning
//! artifacts).

use crate::geometry::{self, Point};
use crate::image::ImageU8;
use crate::types::CellGeometry;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Mask geometry and decision thresholds of the mark engine.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MarkParams {
    /// Stroke width of the main cross, as a fraction of the cell width.
    pub cross_thickness: f32,
    /// Surviving fraction of the diagonal for the main cross mask.
    pub cross_margin: f32,
    /// Surviving fraction of the diagonal for the secondary cross mask.
    pub cross_margin_2: f32,
    /// Surviving fraction of the diagonal for the cell-interior quad.
    pub cell_margin: f32,
    /// Mask foreground fraction for a provisional "marked" verdict.
    pub cross_threshold: f32,
    /// Mask foreground fraction below which the cell is cleared again.
    pub clear_in_threshold: f32,
    /// Outside-mask foreground fraction above which the cell is cleared.
    pub clear_out_threshold: f32,
}

impl Default for MarkParams {
    fn default() -> Self {
        Self {
            cross_thickness: 0.2,
            cross_margin: 0.6,
            cross_margin_2: 0.75,
            cell_margin: 0.9,
            cross_threshold: 0.08,
            clear_in_threshold: 0.2,
            clear_out_threshold: 0.35,
        }
    }
}

/// Pixel tallies of one cell, gathered in a single pass over its
/// bounding box.
struct CellCounts {
    mask_pixels: u32,
    masked_set: u32,
    cell_pixels: u32,
    cell_set: u32,
}

/// Decides every cell of every question row and aggregates the answers.
pub fn decide_cells(
    image: &ImageU8,
    answer_cells: &[Vec<CellGeometry>],
    params: &MarkParams,
) -> Vec<i32> {
    answer_cells
        .iter()
        .map(|row| {
            let marks: Vec<bool> = row
                .iter()
                .map(|cell| decide_cell(image, cell, params))
                .collect();
            decide_answer(&marks)
        })
        .collect()
}

/// True when the cell holds a deliberate mark.
pub fn decide_cell(image: &ImageU8, cell: &CellGeometry, params: &MarkParams) -> bool {
    let thickness = geometry::distance(cell.plu, cell.pru) * params.cross_thickness;

    let (a1, b1) = geometry::closer_points_rel(cell.plu, cell.prd, params.cross_margin, thickness / 2.0);
    let (a2, b2) = geometry::closer_points_rel(cell.pru, cell.pld, params.cross_margin, thickness / 2.0);
    let (c1, d1) =
        geometry::closer_points_rel(cell.plu, cell.prd, params.cross_margin_2, thickness / 4.0);
    let (c2, d2) =
        geometry::closer_points_rel(cell.pru, cell.pld, params.cross_margin_2, thickness / 4.0);
    let strokes = [
        (a1, b1, thickness / 2.0),
        (a2, b2, thickness / 2.0),
        (c1, d1, thickness / 4.0),
        (c2, d2, thickness / 4.0),
    ];

    let (iplu, iprd) = geometry::closer_points_rel(cell.plu, cell.prd, params.cell_margin, 0.0);
    let (ipru, ipld) = geometry::closer_points_rel(cell.pru, cell.pld, params.cell_margin, 0.0);
    let quad = [iplu, ipru, iprd, ipld];

    let counts = count_cell_pixels(image, cell, &strokes, &quad, thickness);
    if counts.mask_pixels == 0 {
        return false;
    }
    let masked_fraction = counts.masked_set as f32 / counts.mask_pixels as f32;
    let mut marked = masked_fraction > params.cross_threshold;
    if marked {
        // A fully dark cell passes the mask test too; require the inside
        // fraction to stay meaningful and the outside to stay mostly clear.
        let outside_total = counts.cell_pixels.saturating_sub(counts.mask_pixels);
        let outside_set = counts.cell_set.saturating_sub(counts.masked_set);
        if masked_fraction < params.clear_in_threshold {
            marked = false;
        } else if outside_total > 0
            && outside_set as f32 > params.clear_out_threshold * outside_total as f32
        {
            marked = false;
        }
    }
    marked
}

/// Aggregates per-cell verdicts into the per-question decision.
///
/// No marked cell is a blank (0), exactly one is its 1-based index, and
/// several marked cells mean the answer is ambiguous (-1).
pub fn decide_answer(cell_decisions: &[bool]) -> i32 {
    let mut marked = cell_decisions.iter().enumerate().filter(|(_, &m)| m);
    match (marked.next(), marked.next()) {
        (None, _) => 0,
        (Some((i, _)), None) => i as i32 + 1,
        (Some(_), Some(_)) => -1,
    }
}

fn count_cell_pixels(
    image: &ImageU8,
    cell: &CellGeometry,
    strokes: &[(Point, Point, f32); 4],
    quad: &[Point; 4],
    thickness: f32,
) -> CellCounts {
    let pad = thickness.ceil() as i32;
    let xs = [cell.plu.x, cell.pru.x, cell.pld.x, cell.prd.x];
    let ys = [cell.plu.y, cell.pru.y, cell.pld.y, cell.prd.y];
    let x0 = xs.iter().min().unwrap() - pad;
    let x1 = xs.iter().max().unwrap() + pad;
    let y0 = ys.iter().min().unwrap() - pad;
    let y1 = ys.iter().max().unwrap() + pad;

    let mut counts = CellCounts {
        mask_pixels: 0,
        masked_set: 0,
        cell_pixels: 0,
        cell_set: 0,
    };
    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Point::new(x, y);
            let v = p.to_vec();
            let in_mask = strokes
                .iter()
                .any(|&(a, b, half)| distance_to_segment(v, a, b) <= half);
            let in_cell = point_in_quad(v, quad);
            if !in_mask && !in_cell {
                continue;
            }
            let set = image.fg(p);
            if in_mask {
                counts.mask_pixels += 1;
                if set {
                    counts.masked_set += 1;
                }
            }
            if in_cell {
                counts.cell_pixels += 1;
                if set {
                    counts.cell_set += 1;
                }
            }
        }
    }
    counts
}

/// Distance from `p` to the segment `a..b`.
fn distance_to_segment(p: Vector2<f32>, a: Point, b: Point) -> f32 {
    let a = a.to_vec();
    let b = b.to_vec();
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < 1e-6 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Point-in-convex-quad test; `quad` is ordered plu, pru, prd, pld.
fn point_in_quad(p: Vector2<f32>, quad: &[Point; 4]) -> bool {
    let mut sign = 0i8;
    for i in 0..4 {
        let a = quad[i].to_vec();
        let b = quad[(i + 1) % 4].to_vec();
        let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
        if cross.abs() < 1e-6 {
            continue;
        }
        let s = if cross > 0.0 { 1 } else { -1 };
        if sign == 0 {
            sign = s;
        } else if sign != s {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::GrayBuffer;

    fn square_cell(x: i32, y: i32, size: i32) -> CellGeometry {
        CellGeometry::new(
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x, y + size),
            Point::new(x + size, y + size),
        )
    }

    /// Draws a thick stroke between two points.
    fn draw_stroke(buf: &mut GrayBuffer, a: Point, b: Point, width: i32) {
        for p in geometry::walk_line(a, b) {
            for dy in -width / 2..=width / 2 {
                for dx in -width / 2..=width / 2 {
                    let (x, y) = (p.x + dx, p.y + dy);
                    if x >= 0 && y >= 0 && (x as usize) < buf.width() && (y as usize) < buf.height()
                    {
                        buf.set(x as usize, y as usize, 255);
                    }
                }
            }
        }
    }

    fn draw_cross(buf: &mut GrayBuffer, cell: &CellGeometry) {
        draw_stroke(buf, cell.plu, cell.prd, 5);
        draw_stroke(buf, cell.pru, cell.pld, 5);
    }

    #[test]
    fn empty_cell_is_unmarked() {
        let buf = GrayBuffer::zeroed(120, 120);
        let cell = square_cell(20, 20, 50);
        assert!(!decide_cell(&buf.as_view(), &cell, &MarkParams::default()));
    }

    #[test]
    fn crossed_cell_is_marked() {
        let mut buf = GrayBuffer::zeroed(120, 120);
        let cell = square_cell(20, 20, 50);
        draw_cross(&mut buf, &cell);
        assert!(decide_cell(&buf.as_view(), &cell, &MarkParams::default()));
    }

    #[test]
    fn fully_dark_cell_is_cleared() {
        let mut buf = GrayBuffer::zeroed(120, 120);
        let cell = square_cell(20, 20, 50);
        for y in 20..=70 {
            for x in 20..=70 {
                buf.set(x, y, 255);
            }
        }
        assert!(!decide_cell(&buf.as_view(), &cell, &MarkParams::default()));
    }

    #[test]
    fn decide_answer_blank_single_multiple() {
        assert_eq!(decide_answer(&[]), 0);
        assert_eq!(decide_answer(&[false, false, false]), 0);
        assert_eq!(decide_answer(&[false, false, true, false]), 3);
        assert_eq!(decide_answer(&[true, false, true]), -1);
        assert_eq!(decide_answer(&[true, true, true, true]), -1);
    }

    #[test]
    fn decide_cells_aggregates_rows() {
        let mut buf = GrayBuffer::zeroed(300, 120);
        let row1: Vec<CellGeometry> = (0..4).map(|i| square_cell(10 + 60 * i, 20, 50)).collect();
        let row2: Vec<CellGeometry> = row1.clone();
        draw_cross(&mut buf, &row1[2]);
        let rows = vec![row1, row2];
        let decisions = decide_cells(&buf.as_view(), &rows, &MarkParams::default());
        assert_eq!(decisions, vec![3, 0]);
    }
}
