//! Reconstruction of the answer-table corner grid from axis lines.
//!
//! Consecutive row/column lines are intersected into one corner matrix per
//! table; tables consume disjoint, contiguous column ranges. A battery of
//! geometric sanity checks (bounds, row-spacing regularity, strict
//! monotonicity) guards against missed or duplicated lines. A rejected
//! grid is the steady-state "no grid this frame" outcome and yields an
//! empty result, not an error.

use crate::error::DetectError;
use crate::geometry::{self, Line, Point};
use crate::types::{expected_columns, expected_rows, CellGeometry, TableDims};
use log::debug;
use serde::Serialize;

/// Multiplier on the mean row gap spread tolerated by the regularity check.
pub const CORNER_TOLERANCE_MUL: f32 = 6.0;

/// Corner points of one answer table: `(questions + 1) x (choices + 1)`.
///
/// Row y-coordinates strictly increase downward, column x-coordinates
/// strictly increase rightward; [`check_corners`] enforces the invariant
/// before a matrix is handed out.
#[derive(Clone, Debug, Serialize)]
pub struct CornerMatrix {
    points: Vec<Vec<Point>>,
}

impl CornerMatrix {
    pub fn num_rows(&self) -> usize {
        self.points.len()
    }

    pub fn num_cols(&self) -> usize {
        self.points.first().map_or(0, |r| r.len())
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> Point {
        self.points[row][col]
    }

    pub fn row(&self, row: usize) -> &[Point] {
        &self.points[row]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Point]> {
        self.points.iter().map(|r| r.as_slice())
    }

    /// Cells of the table, row by row (one row per question).
    pub fn cells(&self) -> Vec<Vec<CellGeometry>> {
        let mut rows = Vec::with_capacity(self.num_rows().saturating_sub(1));
        for i in 0..self.num_rows().saturating_sub(1) {
            let mut row = Vec::with_capacity(self.num_cols().saturating_sub(1));
            for j in 0..self.num_cols().saturating_sub(1) {
                row.push(CellGeometry::new(
                    self.at(i, j),
                    self.at(i, j + 1),
                    self.at(i + 1, j),
                    self.at(i + 1, j + 1),
                ));
            }
            rows.push(row);
        }
        rows
    }
}

/// Intersects row/column lines into per-table corner matrices.
///
/// Returns an empty vector when the line counts cannot be reconciled with
/// the layout or any validation fails; `Err` only on the unexpected
/// near-parallel intersection that upstream perpendicularity checks should
/// have made impossible.
pub fn cell_corners(
    hlines: &[Line],
    vlines: &[Line],
    image_width: usize,
    image_height: usize,
    dims: &[TableDims],
) -> Result<Vec<CornerMatrix>, DetectError> {
    if dims.is_empty() {
        return Err(DetectError::EmptyLayout);
    }
    let v_expected = expected_columns(dims);
    let h_expected = expected_rows(dims);

    let vlines_owned: Vec<Line>;
    let vlines: &[Line] = if vlines.len() == v_expected {
        vlines
    } else if vlines.len() > v_expected && vlines.len() <= v_expected + 2 {
        vlines_owned = geometry::discard_spurious_lines(vlines, v_expected);
        &vlines_owned
    } else {
        debug!("grid: {} column lines, expected {v_expected}", vlines.len());
        return Ok(Vec::new());
    };
    if hlines.len() < h_expected {
        debug!("grid: {} row lines, expected {h_expected}", hlines.len());
        return Ok(Vec::new());
    }
    // Extra rows sit above the tables (ID strip rails); keep the bottom ones.
    let hlines = &hlines[hlines.len() - h_expected..];

    let mut matrices = Vec::with_capacity(dims.len());
    let mut vini = 0usize;
    for table in dims {
        let mut points = Vec::with_capacity(table.questions as usize + 1);
        for i in 0..=table.questions as usize {
            let mut row = Vec::with_capacity(table.choices as usize + 1);
            for j in vini..=vini + table.choices as usize {
                let corner = geometry::intersection(hlines[i], vlines[j]).ok_or(
                    DetectError::DegenerateIntersection {
                        hline: hlines[i],
                        vline: vlines[j],
                    },
                )?;
                row.push(corner);
            }
            points.push(row);
        }
        matrices.push(CornerMatrix { points });
        vini += 1 + table.choices as usize;
    }
    if check_corners(&matrices, image_width, image_height) {
        Ok(matrices)
    } else {
        Ok(Vec::new())
    }
}

/// Validates reconstructed corner matrices.
///
/// Checks, in order: row-spacing regularity on one representative table
/// (second difference of row y-coordinates bounded, minimum gap at least
/// half the maximum), image bounds for every corner, and strict x/y
/// monotonicity across every matrix.
pub fn check_corners(matrices: &[CornerMatrix], width: usize, height: usize) -> bool {
    let representative = &matrices[(matrices.len() - 1) / 2];
    let ypoints: Vec<i32> = representative
        .rows()
        .map(|row| row.last().unwrap().y)
        .collect();
    let difs: Vec<i32> = ypoints.windows(2).map(|w| w[1] - w[0]).collect();
    if let (Some(&max_dif), Some(&min_dif)) = (difs.iter().max(), difs.iter().min()) {
        let difs2: Vec<i32> = difs.windows(2).map(|w| w[1] - w[0]).collect();
        if let Some(&max_dif2) = difs2.iter().max() {
            let bound = 1.0 + (max_dif - min_dif) as f32 / difs.len() as f32 * CORNER_TOLERANCE_MUL;
            if max_dif2 as f32 > bound {
                debug!("grid: irregular row spacing (second difference {max_dif2})");
                return false;
            }
        }
        if max_dif > 2 * min_dif {
            debug!("grid: row gap ratio out of range ({min_dif}..{max_dif})");
            return false;
        }
    }
    for matrix in matrices {
        for row in matrix.rows() {
            for point in row {
                if !point.in_bounds(width, height) {
                    debug!("grid: corner ({}, {}) out of bounds", point.x, point.y);
                    return false;
                }
            }
        }
    }
    for matrix in matrices {
        for i in 0..matrix.num_rows() - 1 {
            for j in 0..matrix.num_cols() - 1 {
                if matrix.at(i, j).y >= matrix.at(i + 1, j).y
                    || matrix.at(i, j + 1).y >= matrix.at(i + 1, j + 1).y
                    || matrix.at(i, j).x >= matrix.at(i, j + 1).x
                    || matrix.at(i + 1, j).x >= matrix.at(i + 1, j + 1).x
                {
                    debug!("grid: monotonicity broken at ({i}, {j})");
                    return false;
                }
            }
        }
    }
    true
}

/// Stacks the answer cells of all tables into one row per question.
///
/// The natural order numbers each table top to bottom before moving to the
/// next table; `left_to_right` renumbers across tables row by row instead.
pub fn answer_cells(
    matrices: &[CornerMatrix],
    dims: &[TableDims],
    left_to_right: bool,
) -> Vec<Vec<CellGeometry>> {
    let mut cells: Vec<Vec<CellGeometry>> = Vec::new();
    for matrix in matrices {
        cells.extend(matrix.cells());
    }
    if left_to_right {
        cells = reorder_left_to_right(cells, dims);
    }
    cells
}

fn reorder_left_to_right(
    cells: Vec<Vec<CellGeometry>>,
    dims: &[TableDims],
) -> Vec<Vec<CellGeometry>> {
    let num_rows = dims.iter().map(|d| d.questions as usize).max().unwrap_or(0);
    let mut heads = vec![1usize];
    for table in dims {
        heads.push(heads.last().unwrap() + table.questions as usize);
    }
    heads.push(cells.len() + 1);
    let mut reordered = Vec::with_capacity(cells.len());
    for row in 0..num_rows {
        for column in 0..dims.len() {
            let pos = heads[column] + row;
            if pos < heads[column + 1] {
                reordered.push(cells[pos - 1].clone());
            }
        }
    }
    reordered
}
