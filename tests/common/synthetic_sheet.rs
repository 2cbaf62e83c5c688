//! Synthetic binarized answer sheets drawn pixel by pixel.
//!
//! The layout is a single 4-choice, 10-question table with an ID strip
//! above it and the model circles below it, sized so that every printed
//! stroke clears a Hough vote threshold of 200 and nothing else does.

use omr_detector::geometry::{self, Point};
use omr_detector::image::GrayBuffer;

pub const WIDTH: usize = 640;
pub const HEIGHT: usize = 480;

pub const NUM_CHOICES: usize = 4;
pub const NUM_QUESTIONS: usize = 10;
/// Leftmost column line of the answer table.
pub const TABLE_X0: i32 = 140;
pub const COLUMN_STEP: i32 = 60;
/// Topmost row line of the answer table.
pub const TABLE_Y0: i32 = 120;
pub const ROW_STEP: i32 = 30;
/// All printed strokes are this many pixels thick.
pub const STROKE: i32 = 3;

pub const RAIL_UP_Y: i32 = 40;
pub const RAIL_DOWN_Y: i32 = 80;
pub const NUM_DIGITS: usize = 8;
pub const ID_CELL_WIDTH: i32 = 40;

pub fn blank_sheet() -> GrayBuffer {
    GrayBuffer::zeroed(WIDTH, HEIGHT)
}

pub fn vline_x(j: usize) -> i32 {
    TABLE_X0 + COLUMN_STEP * j as i32
}

pub fn hline_y(i: usize) -> i32 {
    TABLE_Y0 + ROW_STEP * i as i32
}

fn set(buf: &mut GrayBuffer, x: i32, y: i32) {
    if x >= 0 && y >= 0 && (x as usize) < buf.width() && (y as usize) < buf.height() {
        buf.set(x as usize, y as usize, 255);
    }
}

fn fill_rect(buf: &mut GrayBuffer, x0: i32, y0: i32, x1: i32, y1: i32) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            set(buf, x, y);
        }
    }
}

/// Prints the answer-table line grid.
pub fn draw_grid(buf: &mut GrayBuffer) {
    let x_end = vline_x(NUM_CHOICES) + STROKE - 1;
    let y_end = hline_y(NUM_QUESTIONS) + STROKE - 1;
    for j in 0..=NUM_CHOICES {
        let x = vline_x(j);
        fill_rect(buf, x, hline_y(0), x + STROKE - 1, y_end);
    }
    for i in 0..=NUM_QUESTIONS {
        let y = hline_y(i);
        fill_rect(buf, vline_x(0), y, x_end, y + STROKE - 1);
    }
}

fn draw_stroke(buf: &mut GrayBuffer, a: Point, b: Point, width: i32) {
    for p in geometry::walk_line(a, b) {
        for dy in -width / 2..=width / 2 {
            for dx in -width / 2..=width / 2 {
                set(buf, p.x + dx, p.y + dy);
            }
        }
    }
}

/// Draws an X mark in one bubble, slightly inset from the cell borders.
pub fn draw_cross(buf: &mut GrayBuffer, question: usize, choice: usize) {
    let x0 = vline_x(choice);
    let y0 = hline_y(question);
    let ix = COLUMN_STEP / 10;
    let iy = ROW_STEP / 10;
    let plu = Point::new(x0 + ix, y0 + iy);
    let prd = Point::new(x0 + COLUMN_STEP - ix, y0 + ROW_STEP - iy);
    let pru = Point::new(x0 + COLUMN_STEP - ix, y0 + iy);
    let pld = Point::new(x0 + ix, y0 + ROW_STEP - iy);
    draw_stroke(buf, plu, prd, 5);
    draw_stroke(buf, pru, pld, 5);
}

fn fill_circle(buf: &mut GrayBuffer, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                set(buf, cx + dx, cy + dy);
            }
        }
    }
}

/// Prints the model circles under the table, one filled circle per bit
/// pair: the upper one for a set bit, the lower one otherwise.
pub fn draw_infobits(buf: &mut GrayBuffer, bits: &[bool]) {
    assert!(bits.len() <= NUM_CHOICES);
    let radius = (ROW_STEP as f32 * 0.333).round() as i32;
    let up_y = hline_y(NUM_QUESTIONS) + (ROW_STEP as f32 / 2.6).round() as i32;
    for (i, &bit) in bits.iter().enumerate() {
        let cx = vline_x(i + 1) - COLUMN_STEP / 2;
        let cy = if bit { up_y } else { up_y + ROW_STEP };
        fill_circle(buf, cx, cy, radius);
    }
}

/// Prints the ID strip: two rails, the digit-cell separators, and a
/// handwritten "1" in every cell.
pub fn draw_id_box(buf: &mut GrayBuffer) {
    let x0 = TABLE_X0;
    let x1 = x0 + ID_CELL_WIDTH * NUM_DIGITS as i32 + STROKE - 1;
    for rail_y in [RAIL_UP_Y, RAIL_DOWN_Y] {
        fill_rect(buf, x0, rail_y, x1, rail_y + STROKE - 1);
    }
    for i in 0..=NUM_DIGITS {
        let x = x0 + ID_CELL_WIDTH * i as i32;
        fill_rect(buf, x, RAIL_UP_Y, x + STROKE - 1, RAIL_DOWN_Y + STROKE - 1);
    }
    for i in 0..NUM_DIGITS {
        let cx = x0 + ID_CELL_WIDTH * i as i32 + ID_CELL_WIDTH / 2;
        fill_rect(buf, cx - 2, RAIL_UP_Y + 10, cx + 1, RAIL_DOWN_Y - 8);
    }
}
