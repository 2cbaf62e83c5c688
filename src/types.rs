//! Data objects exchanged between the detection stages and their callers.

use crate::geometry::{Line, Point};
use serde::{Deserialize, Serialize};

/// Dimensions of one answer table: bubbles per question and question count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDims {
    pub choices: u32,
    pub questions: u32,
}

impl TableDims {
    pub fn new(choices: u32, questions: u32) -> Self {
        Self { choices, questions }
    }
}

/// Column lines expected on a sheet: one separator per table plus one line
/// per choice column.
pub fn expected_columns(dims: &[TableDims]) -> usize {
    dims.len() + dims.iter().map(|d| d.choices as usize).sum::<usize>()
}

/// Row lines expected on a sheet, driven by the tallest table.
pub fn expected_rows(dims: &[TableDims]) -> usize {
    1 + dims.iter().map(|d| d.questions as usize).max().unwrap_or(0)
}

/// Total number of questions across all tables.
pub fn total_questions(dims: &[TableDims]) -> usize {
    dims.iter().map(|d| d.questions as usize).sum()
}

/// One bubble or ID-digit box: its four corners.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct CellGeometry {
    /// Upper-left corner.
    pub plu: Point,
    /// Upper-right corner.
    pub pru: Point,
    /// Lower-left corner.
    pub pld: Point,
    /// Lower-right corner.
    pub prd: Point,
}

impl CellGeometry {
    pub fn new(plu: Point, pru: Point, pld: Point, prd: Point) -> Self {
        Self { plu, pru, pld, prd }
    }

    pub fn corners(&self) -> [Point; 4] {
        [self.plu, self.pru, self.pld, self.prd]
    }
}

/// Ordered progress flags of one detection pass.
///
/// Monotonic within a pass: a later flag is never set while an earlier one
/// is false.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DetectionStatus {
    /// Enough raw Hough lines were found.
    pub lines: bool,
    /// Two perpendicular axes were identified.
    pub axes: bool,
    /// The per-table corner matrices passed validation.
    pub grid: bool,
    /// Per-question mark decisions were made.
    pub marks: bool,
    /// The two ID-strip rail lines were located.
    pub id_rails: bool,
    /// The ID digit cells were fixed.
    pub id_box: bool,
}

/// Advisory overlay data: detected geometry for debug rendering. Never
/// feeds back into decisions.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Overlay {
    pub vertical_lines: Vec<Line>,
    pub horizontal_lines: Vec<Line>,
    pub cell_corners: Vec<Point>,
    pub id_rails: Vec<Line>,
    pub id_corners: Vec<Point>,
}

/// Aggregate result of one detection pass over a still image.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SheetResult {
    /// True when every enabled stage succeeded.
    pub success: bool,
    /// Per-question decision: 0 blank, `1..=choices` selected option,
    /// -1 ambiguous (several bubbles marked).
    pub answers: Vec<i32>,
    /// Decoded sheet model, `None` when the info-bits failed validation.
    pub model: Option<char>,
    /// Decoded student ID, one character per digit cell.
    pub student_id: Option<String>,
    /// Per-digit confidence vectors, index = digit value.
    pub id_scores: Vec<[f32; 10]>,
    pub status: DetectionStatus,
    /// Fraction of enabled stages completed, in `[0, 1]`.
    pub progress: f32,
    /// Hough threshold active when the frame was processed.
    pub threshold: u32,
    pub overlay: Option<Overlay>,
}
