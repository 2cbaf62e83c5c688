//! Handwritten digit recognition for the ID box cells.
//!
//! The classifier seam is the [`DigitClassifier`] trait so that a
//! statistically trained model can be plugged in later; the shipped
//! implementation scores line-crossing profiles against per-digit
//! templates.

pub mod crossings;
pub mod templates;

use crate::geometry::{self, Point};
use crate::image::ImageU8;
use crate::types::CellGeometry;

use crossings::{scan_crossings, signatures, trim_empty_rows, Crossing};

/// Probe lines sampled in each direction across a digit cell.
pub const CROSS_NUM_LINES: usize = 15;
/// Pixels walked past the cell border before sampling starts.
pub const CELL_MARGIN: i32 = 2;

/// Outcome of classifying one digit cell.
#[derive(Clone, Debug, PartialEq)]
pub struct DigitDecision {
    /// Recognized digit, `None` when no template scored above zero.
    pub digit: Option<u8>,
    /// Per-digit confidence, index = digit value.
    pub scores: [f32; 10],
}

impl DigitDecision {
    pub fn none() -> Self {
        Self {
            digit: None,
            scores: [0.0; 10],
        }
    }
}

/// Recognizes the digit written in one cell.
pub trait DigitClassifier {
    fn classify(&self, image: &ImageU8, cell: &CellGeometry) -> DigitDecision;
}

/// Template classifier over horizontal and vertical stroke-crossing
/// profiles.
#[derive(Clone, Copy, Debug, Default)]
pub struct CrossingsClassifier;

impl DigitClassifier for CrossingsClassifier {
    fn classify(&self, image: &ImageU8, cell: &CellGeometry) -> DigitDecision {
        let cell = adjust_cell_corners(image, cell);
        let left = geometry::interpolate_line(cell.plu, cell.pld, CROSS_NUM_LINES);
        let right = geometry::interpolate_line(cell.pru, cell.prd, CROSS_NUM_LINES);
        let up = geometry::interpolate_line(cell.plu, cell.pru, CROSS_NUM_LINES);
        let down = geometry::interpolate_line(cell.pld, cell.prd, CROSS_NUM_LINES);
        let mut hcrossings: Vec<Vec<Crossing>> = Vec::with_capacity(CROSS_NUM_LINES);
        let mut vcrossings: Vec<Vec<Crossing>> = Vec::with_capacity(CROSS_NUM_LINES);
        for i in 0..CROSS_NUM_LINES {
            let offset = i as f32 / (CROSS_NUM_LINES - 1) as f32;
            hcrossings.push(scan_crossings(image, left[i], right[i], offset));
            vcrossings.push(scan_crossings(image, up[i], down[i], offset));
        }
        let hcrossings = trim_empty_rows(hcrossings);
        let vcrossings = trim_empty_rows(vcrossings);
        if hcrossings.is_empty() || vcrossings.is_empty() {
            return DigitDecision::none();
        }
        let (hsig, vsig) = signatures(&hcrossings, &vcrossings);
        templates::score_digits(&hcrossings, &vcrossings, &hsig, &vsig)
    }
}

/// Moves each corner inward along its diagonal until just past the cell
/// border stroke, leaving a small margin.
pub fn adjust_cell_corners(image: &ImageU8, cell: &CellGeometry) -> CellGeometry {
    CellGeometry::new(
        adjust_cell_corner(image, cell.plu, cell.prd),
        adjust_cell_corner(image, cell.pru, cell.pld),
        adjust_cell_corner(image, cell.pld, cell.pru),
        adjust_cell_corner(image, cell.prd, cell.plu),
    )
}

fn adjust_cell_corner(image: &ImageU8, corner: Point, towards: Point) -> Point {
    let mut margin: Option<i32> = None;
    for p in geometry::walk_line(corner, towards) {
        match margin {
            None => {
                if !image.fg(p) {
                    margin = Some(CELL_MARGIN);
                }
            }
            Some(m) => {
                if m == 1 {
                    return p;
                }
                margin = Some(m - 1);
            }
        }
    }
    corner
}
