//! Grading over a two-table layout, from axis lines to per-question
//! decisions.

use omr_detector::geometry::{self, Line, Point};
use omr_detector::grid;
use omr_detector::image::GrayBuffer;
use omr_detector::marks::{self, MarkParams};
use omr_detector::types::{
    expected_columns, expected_rows, total_questions, CellGeometry, TableDims,
};
use std::f32::consts::FRAC_PI_2;

const DIMS: [TableDims; 2] = [
    TableDims {
        choices: 4,
        questions: 10,
    },
    TableDims {
        choices: 4,
        questions: 10,
    },
];

fn layout_lines() -> (Vec<Line>, Vec<Line>) {
    let hlines = (0..expected_rows(&DIMS))
        .map(|i| Line::new(60.0 + 30.0 * i as f32, FRAC_PI_2))
        .collect();
    let vlines = (0..expected_columns(&DIMS))
        .map(|j| Line::new(40.0 + 40.0 * j as f32, 0.0))
        .collect();
    (hlines, vlines)
}

fn draw_stroke(buf: &mut GrayBuffer, a: Point, b: Point) {
    for p in geometry::walk_line(a, b) {
        for dy in -2..=2 {
            for dx in -2..=2 {
                let (x, y) = (p.x + dx, p.y + dy);
                if x >= 0 && y >= 0 && (x as usize) < buf.width() && (y as usize) < buf.height() {
                    buf.set(x as usize, y as usize, 255);
                }
            }
        }
    }
}

fn draw_cross(buf: &mut GrayBuffer, cell: &CellGeometry) {
    let ix = (cell.pru.x - cell.plu.x) / 10;
    let iy = (cell.pld.y - cell.plu.y) / 10;
    draw_stroke(
        buf,
        Point::new(cell.plu.x + ix, cell.plu.y + iy),
        Point::new(cell.prd.x - ix, cell.prd.y - iy),
    );
    draw_stroke(
        buf,
        Point::new(cell.pru.x - ix, cell.pru.y + iy),
        Point::new(cell.pld.x + ix, cell.pld.y - iy),
    );
}

#[test]
fn two_tables_grade_blank_single_and_ambiguous() {
    let (hlines, vlines) = layout_lines();
    let matrices = grid::cell_corners(&hlines, &vlines, 800, 600, &DIMS).unwrap();
    assert_eq!(matrices.len(), 2);
    let cells = grid::answer_cells(&matrices, &DIMS, false);
    assert_eq!(cells.len(), total_questions(&DIMS));

    let mut buf = GrayBuffer::zeroed(800, 600);
    // Question 1: two bubbles crossed.
    draw_cross(&mut buf, &cells[0][0]);
    draw_cross(&mut buf, &cells[0][2]);
    // Question 11 (first row of the second table): one bubble.
    draw_cross(&mut buf, &cells[10][1]);

    let answers = marks::decide_cells(&buf.as_view(), &cells, &MarkParams::default());
    assert_eq!(answers.len(), total_questions(&DIMS));
    assert_eq!(answers[0], -1);
    assert_eq!(answers[10], 2);
    for (i, &a) in answers.iter().enumerate() {
        if i != 0 && i != 10 {
            assert_eq!(a, 0, "question {} should be blank", i + 1);
        }
    }
}
