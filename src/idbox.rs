//! Student ID box: locating its two rail lines above the answer tables and
//! fixing the digit cell corners between them.
//!
//! The rails come from surplus horizontal lines the axis filter kept; the
//! box ends are found by scanning the rails for long ink runs, and the
//! interpolated cell corners are then refined against the printed
//! separators before the digit cells are handed to the classifier.

use crate::geometry::{self, Line, Point};
use crate::image::ImageU8;
use crate::types::{expected_rows, CellGeometry, TableDims};
use log::debug;
use serde::{Deserialize, Serialize};

/// Search ranges and acceptance thresholds of the ID box locator.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct IdBoxParams {
    /// Horizontal search radius when refining a corner column (pixels).
    pub x_var: i32,
    /// Rho offsets tried when scanning a rail and when refining a corner
    /// vertically (pixels).
    pub rho_var: i32,
    /// Minimum separator energy acceptable at any single corner.
    pub min_energy: f32,
    /// Minimum mean separator energy over all corners.
    pub min_mean_energy: f32,
    /// A corner energy above this ends its horizontal search early.
    pub energy_break: f32,
    /// Maximum horizontal misalignment between the two rails' bound points.
    pub discard_distance: i32,
}

impl Default for IdBoxParams {
    fn default() -> Self {
        Self {
            x_var: 10,
            rho_var: 5,
            min_energy: 0.5,
            min_mean_energy: 0.75,
            energy_break: 0.99,
            discard_distance: 20,
        }
    }
}

/// The located ID box: its rails and one cell per digit, left to right.
#[derive(Clone, Debug, Serialize)]
pub struct IdBox {
    pub rails: [Line; 2],
    pub cells: Vec<CellGeometry>,
}

/// Picks the two ID rail lines from all horizontal lines, sorted by rho.
///
/// The last `expected_rows` lines are the answer-table rows; rails must sit
/// above them but within 3.5 row gaps of the top table line, and be at
/// least half a row gap apart.
pub fn select_id_rails(hlines: &[Line], dims: &[TableDims]) -> Option<(Line, Line)> {
    let discard = expected_rows(dims);
    if hlines.len() < discard + 2 {
        return None;
    }
    let first_row = hlines[hlines.len() - discard].rho;
    let second_row = hlines[hlines.len() - discard + 1].rho;
    let lim = 4.5 * first_row - 3.5 * second_row;
    let candidates: Vec<Line> = hlines[..hlines.len() - discard]
        .iter()
        .filter(|l| l.rho > lim)
        .copied()
        .collect();
    if candidates.len() < 2 {
        debug!("idbox: {} rail candidates", candidates.len());
        return None;
    }
    let up = candidates[0];
    let down = candidates[candidates.len() - 1];
    if (down.rho - up.rho).abs() < 0.5 * (second_row - first_row) {
        debug!("idbox: rails too close ({} / {})", up.rho, down.rho);
        return None;
    }
    Some((up, down))
}

/// Locates the digit cells between two rails.
pub fn locate_id_box(
    image: &ImageU8,
    rails: (Line, Line),
    num_digits: usize,
    params: &IdBoxParams,
) -> Option<IdBox> {
    if num_digits == 0 {
        return None;
    }
    let bounds_up = rail_bounds_candidates(image, rails.0, params);
    let bounds_down = rail_bounds_candidates(image, rails.1, params);
    let mut pairs: Vec<(Bounds, Bounds)> = Vec::new();
    for &up in &bounds_up {
        for &down in &bounds_down {
            if (up.0.x - down.0.x).abs() <= params.discard_distance
                && (up.1.x - down.1.x).abs() <= params.discard_distance
            {
                pairs.push((up, down));
            }
        }
    }
    pairs.sort_by(|a, b| {
        let span_a = geometry::distance(a.0 .0, a.0 .1) + geometry::distance(a.1 .0, a.1 .1);
        let span_b = geometry::distance(b.0 .0, b.0 .1) + geometry::distance(b.1 .0, b.1 .1);
        span_b.total_cmp(&span_a)
    });

    for (up, down) in pairs {
        let mut corners_up = geometry::interpolate_line(up.0, up.1, num_digits + 1);
        let mut corners_down = geometry::interpolate_line(down.0, down.1, num_digits + 1);
        if !adjust_corners(image, &mut corners_up, &mut corners_down, params) {
            continue;
        }
        for i in 0..corners_up.len() {
            corners_up[i] = adjust_corner_vertically(image, corners_up[i], params.rho_var);
            corners_down[i] = adjust_corner_vertically(image, corners_down[i], params.rho_var);
        }
        let cells = (0..num_digits)
            .map(|i| {
                CellGeometry::new(
                    corners_up[i],
                    corners_up[i + 1],
                    corners_down[i],
                    corners_down[i + 1],
                )
            })
            .collect();
        return Some(IdBox {
            rails: [rails.0, rails.1],
            cells,
        });
    }
    debug!("idbox: no rail bound pair passed corner adjustment");
    None
}

type Bounds = (Point, Point);

/// Ink-run bounds of a rail, tried at several rho offsets. Candidates are
/// deduplicated and ordered longest span first.
fn rail_bounds_candidates(image: &ImageU8, rail: Line, params: &IdBoxParams) -> Vec<Bounds> {
    let mut offsets = vec![0i32];
    for i in 1..=params.rho_var {
        offsets.push(i);
        offsets.push(-i);
    }
    let mut candidates: Vec<Bounds> = Vec::new();
    for offset in offsets {
        let line = Line::new(rail.rho + offset as f32, rail.theta);
        if let Some(bounds) = line_bounds(image, line) {
            if !candidates.contains(&bounds) {
                candidates.push(bounds);
            }
        }
    }
    candidates.sort_by(|a, b| {
        geometry::distance(b.0, b.1).total_cmp(&geometry::distance(a.0, a.1))
    });
    candidates
}

/// First and last long ink run along a near-horizontal line.
///
/// The start is the first pixel of the first run of three foreground
/// pixels; the end closes the last run longer than two.
fn line_bounds(image: &ImageU8, line: Line) -> Option<Bounds> {
    let start = line.point_at_x(0.0)?;
    let stop = line.point_at_x(image.width() as f32 - 1.0)?;
    let mut ini: Option<Point> = None;
    let mut end: Option<Point> = None;
    let mut run_start: Option<Point> = None;
    let mut run_len = 0usize;
    let mut last = start;
    for p in geometry::walk_line(start, stop) {
        if image.fg(p) {
            if run_len == 0 {
                run_start = Some(p);
            }
            run_len += 1;
            last = p;
        } else {
            if run_len >= 3 && ini.is_none() {
                ini = run_start;
            }
            if run_len > 2 {
                end = Some(last);
            }
            run_len = 0;
        }
    }
    if run_len >= 3 && ini.is_none() {
        ini = run_start;
    }
    if run_len > 2 {
        end = Some(last);
    }
    match (ini, end) {
        (Some(a), Some(b)) if b.x > a.x => Some((a, b)),
        _ => None,
    }
}

/// Refines corner columns horizontally and checks separator energies.
fn adjust_corners(
    image: &ImageU8,
    corners_up: &mut [Point],
    corners_down: &mut [Point],
    params: &IdBoxParams,
) -> bool {
    let mut energies = Vec::with_capacity(corners_up.len());
    for i in 0..corners_up.len() {
        let (energy, up, down) =
            adjust_corner_pair(image, corners_up[i], corners_down[i], params);
        corners_up[i] = up;
        corners_down[i] = down;
        energies.push(energy);
    }
    let min = energies.iter().copied().fold(f32::INFINITY, f32::min);
    let mean = energies.iter().sum::<f32>() / energies.len() as f32;
    if min < params.min_energy || mean <= params.min_mean_energy {
        debug!("idbox: separator energies too low (min {min:.2}, mean {mean:.2})");
        return false;
    }
    true
}

/// Shifts a corner pair along x to the strongest separator stroke.
///
/// Ties on the best energy are broken by the shift closest to the average
/// of the tied shifts; an energy above the break threshold wins outright.
fn adjust_corner_pair(
    image: &ImageU8,
    up: Point,
    down: Point,
    params: &IdBoxParams,
) -> (f32, Point, Point) {
    let mut best: Vec<(f32, i32)> = Vec::new();
    for dx in -params.x_var..=params.x_var {
        let a = Point::new(up.x + dx, up.y);
        let b = Point::new(down.x + dx, down.y);
        let energy = separator_energy(image, a, b);
        if energy > params.energy_break {
            best = vec![(energy, dx)];
            break;
        }
        match best.first() {
            None => best.push((energy, dx)),
            Some(&(e, _)) if energy > e => best = vec![(energy, dx)],
            Some(&(e, _)) if energy == e => best.push((energy, dx)),
            _ => {}
        }
    }
    let avg = best.iter().map(|&(_, dx)| dx).sum::<i32>() as f32 / best.len() as f32;
    let &(energy, dx) = best
        .iter()
        .min_by(|a, b| (a.1 as f32 - avg).abs().total_cmp(&(b.1 as f32 - avg).abs()))
        .unwrap();
    (
        energy,
        Point::new(up.x + dx, up.y),
        Point::new(down.x + dx, down.y),
    )
}

/// Foreground fraction along the walk between two corner candidates.
fn separator_energy(image: &ImageU8, a: Point, b: Point) -> f32 {
    let points = geometry::walk_line_ordered(a, b);
    if points.is_empty() {
        return 0.0;
    }
    let set = points.iter().filter(|&&p| image.fg(p)).count();
    set as f32 / points.len() as f32
}

/// Snaps a corner vertically onto the rail stroke.
///
/// Each candidate row is scored by its foreground count over a 5-pixel
/// horizontal window; among the best rows the median offset wins.
fn adjust_corner_vertically(image: &ImageU8, p: Point, rho_var: i32) -> Point {
    let mut scored: Vec<(usize, i32)> = Vec::new();
    for dy in -rho_var..=rho_var {
        let count = (-2..=2)
            .filter(|&dx| image.fg(Point::new(p.x + dx, p.y + dy)))
            .count();
        scored.push((count, dy));
    }
    let max = scored.iter().map(|&(c, _)| c).max().unwrap_or(0);
    if max == 0 {
        return p;
    }
    let best: Vec<i32> = scored
        .into_iter()
        .filter(|&(c, _)| c == max)
        .map(|(_, dy)| dy)
        .collect();
    Point::new(p.x, p.y + best[best.len() / 2])
}
