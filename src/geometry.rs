//! Integer-pixel geometry primitives shared by every detection stage.
//!
//! Lines live in Hough normal form `x cos(theta) + y sin(theta) = rho`,
//! points on the integer pixel grid. Vertical lines have theta near 0,
//! horizontal ones near pi/2; folding a near-pi line onto a negative rho
//! keeps both representations comparable.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Two line angles count as perpendicular within this tolerance (radians).
pub const PERPENDICULAR_TOLERANCE: f32 = 0.1;

/// A pixel position. Coordinates may be negative or out of image bounds;
/// consumers check with [`Point::in_bounds`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_vec(self) -> Vector2<f32> {
        Vector2::new(self.x as f32, self.y as f32)
    }

    pub fn from_vec(v: Vector2<f32>) -> Self {
        Self::new(v.x.round() as i32, v.y.round() as i32)
    }

    pub fn in_bounds(self, width: usize, height: usize) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as usize) < width && (self.y as usize) < height
    }
}

/// A line in Hough normal form.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub rho: f32,
    pub theta: f32,
}

impl Line {
    pub fn new(rho: f32, theta: f32) -> Self {
        Self { rho, theta }
    }

    /// Point of the line at the given x, `None` for near-vertical lines.
    pub fn point_at_x(&self, x: f32) -> Option<Point> {
        let sin = self.theta.sin();
        if sin.abs() < 1e-6 {
            return None;
        }
        let y = (self.rho - x * self.theta.cos()) / sin;
        Some(Point::new(x.round() as i32, y.round() as i32))
    }

    /// Point of the line at the given y, `None` for near-horizontal lines.
    pub fn point_at_y(&self, y: f32) -> Option<Point> {
        let cos = self.theta.cos();
        if cos.abs() < 1e-6 {
            return None;
        }
        let x = (self.rho - y * self.theta.sin()) / cos;
        Some(Point::new(x.round() as i32, y.round() as i32))
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f32 {
    (a.to_vec() - b.to_vec()).norm()
}

/// True when the two angles differ by a quarter turn, modulo pi.
pub fn angles_perpendicular(a: f32, b: f32) -> bool {
    let diff = (a - b).abs() % std::f32::consts::PI;
    (diff - std::f32::consts::FRAC_PI_2).abs() <= PERPENDICULAR_TOLERANCE
}

/// Angular distance from `angle` to the closest of the given axis angles,
/// folded into `[0, pi/2]`.
pub fn distance_closest_axis(angle: f32, axes: &[f32]) -> f32 {
    axes.iter()
        .map(|axis| {
            let diff = (angle - axis).abs() % std::f32::consts::PI;
            diff.min(std::f32::consts::PI - diff)
        })
        .fold(f32::INFINITY, f32::min)
}

/// Intersection of a row line with a column line.
///
/// `None` when the lines are near parallel; callers that already checked
/// perpendicularity treat that as an internal error.
pub fn intersection(hline: Line, vline: Line) -> Option<Point> {
    let denom = (hline.theta - vline.theta).sin();
    if denom.abs() < 1e-6 {
        return None;
    }
    let y = (hline.rho * vline.theta.cos() - vline.rho * hline.theta.cos()) / denom;
    let cos_v = vline.theta.cos();
    if cos_v.abs() < 1e-6 {
        return None;
    }
    let x = (vline.rho - y * vline.theta.sin()) / cos_v;
    Some(Point::new(x.round() as i32, y.round() as i32))
}

/// Bresenham walk over the pixels of a segment, both endpoints included.
/// Iteration always starts at the first endpoint.
pub struct WalkLine {
    x: i32,
    y: i32,
    end: Point,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    done: bool,
}

impl Iterator for WalkLine {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.done {
            return None;
        }
        let current = Point::new(self.x, self.y);
        if current == self.end {
            self.done = true;
        } else {
            let e2 = 2 * self.err;
            if e2 >= self.dy {
                self.err += self.dy;
                self.x += self.sx;
            }
            if e2 <= self.dx {
                self.err += self.dx;
                self.y += self.sy;
            }
        }
        Some(current)
    }
}

pub fn walk_line(a: Point, b: Point) -> WalkLine {
    let dx = (b.x - a.x).abs();
    let dy = -(b.y - a.y).abs();
    WalkLine {
        x: a.x,
        y: a.y,
        end: b,
        dx,
        dy,
        sx: if a.x < b.x { 1 } else { -1 },
        sy: if a.y < b.y { 1 } else { -1 },
        err: dx + dy,
        done: false,
    }
}

/// Pixels of the segment from `a` to `b`, in walk order.
pub fn walk_line_ordered(a: Point, b: Point) -> Vec<Point> {
    walk_line(a, b).collect()
}

/// `num_points` evenly spaced points from `a` to `b`, endpoints included.
pub fn interpolate_line(a: Point, b: Point, num_points: usize) -> Vec<Point> {
    if num_points < 2 {
        return vec![a];
    }
    let av = a.to_vec();
    let step = (b.to_vec() - av) / (num_points - 1) as f32;
    (0..num_points)
        .map(|i| Point::from_vec(av + step * i as f32))
        .collect()
}

/// Moves both endpoints toward the segment center so that the fraction
/// `ratio` of the original length survives, then trims `abs_offset` more
/// pixels from each end.
pub fn closer_points_rel(p1: Point, p2: Point, ratio: f32, abs_offset: f32) -> (Point, Point) {
    let v1 = p1.to_vec();
    let v2 = p2.to_vec();
    let diff = v2 - v1;
    let len = diff.norm();
    if len < 1e-6 {
        return (p1, p2);
    }
    let offset = len * (1.0 - ratio) / 2.0 + abs_offset;
    let unit = diff / len;
    (
        Point::from_vec(v1 + unit * offset),
        Point::from_vec(v2 - unit * offset),
    )
}

/// Orthogonal projection of a point onto a line.
pub fn project_point(p: Point, line: Line) -> Vector2<f32> {
    let normal = Vector2::new(line.theta.cos(), line.theta.sin());
    let v = p.to_vec();
    v - normal * (v.dot(&normal) - line.rho)
}

/// Smallest rho gap between consecutive lines; the slice must be sorted by
/// rho and hold at least two lines.
pub fn min_rho_difference(lines: &[Line]) -> f32 {
    lines
        .windows(2)
        .map(|w| (w[1].rho - w[0].rho).abs())
        .fold(f32::INFINITY, f32::min)
}

/// Keeps the `expected`-sized subset of lines whose consecutive rho gaps
/// have the least variance. Lines must be sorted by rho.
pub fn discard_spurious_lines(lines: &[Line], expected: usize) -> Vec<Line> {
    if lines.len() <= expected {
        return lines.to_vec();
    }
    let mut best: Option<(f32, Vec<usize>)> = None;
    let mut combination: Vec<usize> = (0..expected).collect();
    loop {
        let gaps: Vec<f32> = combination
            .windows(2)
            .map(|w| lines[w[1]].rho - lines[w[0]].rho)
            .collect();
        let mean = gaps.iter().sum::<f32>() / gaps.len() as f32;
        let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f32>() / gaps.len() as f32;
        if best.as_ref().is_none_or(|(v, _)| variance < *v) {
            best = Some((variance, combination.clone()));
        }
        if !advance_combination(&mut combination, lines.len()) {
            break;
        }
    }
    let (_, indices) = best.unwrap();
    indices.into_iter().map(|i| lines[i]).collect()
}

/// Advances `indices` to the next lexicographic k-combination of `0..n`.
/// Returns false once the last combination has been visited.
fn advance_combination(indices: &mut [usize], n: usize) -> bool {
    let k = indices.len();
    for i in (0..k).rev() {
        if indices[i] < n - k + i {
            indices[i] += 1;
            for j in i + 1..k {
                indices[j] = indices[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn point_bounds() {
        assert!(Point::new(0, 0).in_bounds(10, 10));
        assert!(Point::new(9, 9).in_bounds(10, 10));
        assert!(!Point::new(10, 9).in_bounds(10, 10));
        assert!(!Point::new(-1, 0).in_bounds(10, 10));
    }

    #[test]
    fn line_evaluation() {
        // Horizontal line y = 50.
        let h = Line::new(50.0, FRAC_PI_2);
        assert_eq!(h.point_at_x(20.0), Some(Point::new(20, 50)));
        assert_eq!(h.point_at_y(10.0), None);
        // Vertical line x = 30.
        let v = Line::new(30.0, 0.0);
        assert_eq!(v.point_at_y(80.0), Some(Point::new(30, 80)));
        assert_eq!(v.point_at_x(10.0), None);
    }

    #[test]
    fn perpendicularity_wraps_around_pi() {
        assert!(angles_perpendicular(0.0, FRAC_PI_2));
        assert!(angles_perpendicular(PI - 0.02, FRAC_PI_2));
        assert!(angles_perpendicular(0.05, FRAC_PI_2 + 0.05));
        assert!(!angles_perpendicular(0.0, FRAC_PI_2 + 0.2));
        assert!(!angles_perpendicular(0.3, 0.35));
    }

    #[test]
    fn closest_axis_distance() {
        let axes = [0.0, FRAC_PI_2];
        assert!(distance_closest_axis(0.05, &axes) - 0.05 < 1e-6);
        assert!(distance_closest_axis(FRAC_PI_2 - 0.1, &axes) - 0.1 < 1e-6);
        // Near pi folds back onto the vertical axis.
        assert!(distance_closest_axis(PI - 0.03, &axes) - 0.03 < 1e-6);
    }

    #[test]
    fn axis_aligned_intersection() {
        let h = Line::new(60.0, FRAC_PI_2);
        let v = Line::new(40.0, 0.0);
        assert_eq!(intersection(h, v), Some(Point::new(40, 60)));
    }

    #[test]
    fn tilted_intersection() {
        // Lines at 45 and 135 degrees crossing at (10, 10).
        let sqrt2 = 2.0f32.sqrt();
        let a = Line::new(20.0 / sqrt2, std::f32::consts::FRAC_PI_4);
        let b = Line::new(0.0, 3.0 * std::f32::consts::FRAC_PI_4);
        assert_eq!(intersection(a, b), Some(Point::new(10, 10)));
    }

    #[test]
    fn parallel_lines_do_not_intersect() {
        let a = Line::new(10.0, 0.3);
        let b = Line::new(50.0, 0.3);
        assert_eq!(intersection(a, b), None);
    }

    #[test]
    fn walk_line_covers_endpoints() {
        let points = walk_line_ordered(Point::new(0, 0), Point::new(5, 2));
        assert_eq!(points.first(), Some(&Point::new(0, 0)));
        assert_eq!(points.last(), Some(&Point::new(5, 2)));
        assert_eq!(points.len(), 6);
        // Consecutive points stay 8-connected.
        for w in points.windows(2) {
            assert!((w[1].x - w[0].x).abs() <= 1);
            assert!((w[1].y - w[0].y).abs() <= 1);
        }
    }

    #[test]
    fn walk_line_single_point() {
        let points = walk_line_ordered(Point::new(3, 3), Point::new(3, 3));
        assert_eq!(points, vec![Point::new(3, 3)]);
    }

    #[test]
    fn interpolation_is_even() {
        let points = interpolate_line(Point::new(0, 0), Point::new(10, 0), 6);
        let xs: Vec<i32> = points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0, 2, 4, 6, 8, 10]);
    }

    #[test]
    fn closer_points_shrink_symmetrically() {
        let (a, b) = closer_points_rel(Point::new(0, 0), Point::new(100, 0), 0.6, 0.0);
        assert_eq!(a, Point::new(20, 0));
        assert_eq!(b, Point::new(80, 0));
        let (a, b) = closer_points_rel(Point::new(0, 0), Point::new(100, 0), 0.6, 5.0);
        assert_eq!(a, Point::new(25, 0));
        assert_eq!(b, Point::new(75, 0));
    }

    #[test]
    fn projection_lands_on_the_line() {
        let line = Line::new(30.0, 0.0); // x = 30
        let proj = project_point(Point::new(50, 7), line);
        assert!((proj.x - 30.0).abs() < 1e-4);
        assert!((proj.y - 7.0).abs() < 1e-4);
    }

    #[test]
    fn spurious_line_removal_prefers_even_spacing() {
        let mut lines: Vec<Line> = (0..5).map(|i| Line::new(40.0 * i as f32, 0.0)).collect();
        lines.push(Line::new(95.0, 0.0));
        lines.sort_by(|a, b| a.rho.total_cmp(&b.rho));
        let kept = discard_spurious_lines(&lines, 5);
        let rhos: Vec<f32> = kept.iter().map(|l| l.rho).collect();
        assert_eq!(rhos, vec![0.0, 40.0, 80.0, 120.0, 160.0]);
    }

    #[test]
    fn combination_advance_is_lexicographic() {
        let mut c = vec![0, 1, 2];
        let mut seen = vec![c.clone()];
        while advance_combination(&mut c, 4) {
            seen.push(c.clone());
        }
        assert_eq!(seen, vec![vec![0, 1, 2], vec![0, 1, 3], vec![0, 2, 3], vec![1, 2, 3]]);
    }
}
