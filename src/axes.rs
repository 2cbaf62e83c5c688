//! Clustering of raw Hough lines into two perpendicular axes.
//!
//! The Hough output is an angle-sorted `(rho, theta)` list. Consecutive
//! lines are grouped into clusters by angular proximity, with a wrap-around
//! merge for the two ends of the `[0, π)` range describing the same axis
//! with reversed rho sign. Clusters below the expected line count are
//! dropped; three or four survivors are disambiguated, any other outcome is
//! a detection failure that the retry controller answers across frames.

use crate::geometry::{self, Line};
use crate::types::{expected_columns, expected_rows, TableDims};
use log::debug;
use serde::Serialize;

/// Maximum angular gap (radians) between a line and its cluster.
pub const DIRECTIONS_TOLERANCE: f32 = 0.4;
/// Maximum rho gap between lines collapsed into one.
pub const COLLAPSE_MAX_GAP: f32 = 7.0;

/// A bundle of near-parallel lines: all grid rows or all grid columns.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Axis {
    /// Arithmetic mean of the member angles.
    pub angle: f32,
    /// Members sorted by |rho|.
    pub lines: Vec<Line>,
}

/// The two perpendicular axes of a detected sheet.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AxisPair {
    pub vertical: Axis,
    pub horizontal: Axis,
}

/// Expected outcomes when the axes cannot be identified on this frame.
///
/// These are normal during live capture, not errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxesFailure {
    /// Fewer than two clusters had enough lines.
    TooFewClusters { found: usize },
    /// More than four plausible clusters; the frame is too noisy.
    TooManyClusters { found: usize },
    /// The two surviving clusters are not mutually perpendicular.
    NotPerpendicular,
}

impl std::fmt::Display for AxesFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AxesFailure::TooFewClusters { found } => {
                write!(f, "too few line clusters ({found} < 2)")
            }
            AxesFailure::TooManyClusters { found } => {
                write!(f, "too many line clusters ({found} > 4)")
            }
            AxesFailure::NotPerpendicular => write!(f, "axes are not perpendicular"),
        }
    }
}

/// Groups angle-sorted lines into clusters of near-parallel lines.
///
/// Members of a wrapped cluster are folded onto the first one by negating
/// rho and subtracting π from theta. Each cluster's angle is the mean of
/// its members; members end up sorted by |rho|.
pub fn cluster_directions(lines: &[Line]) -> Vec<Axis> {
    debug_assert!(lines.len() >= 2);
    let mut clusters: Vec<(f32, Vec<Line>)> = Vec::new();
    clusters.push((lines[0].theta, vec![lines[0]]));
    for &line in &lines[1..] {
        let last = clusters.last_mut().unwrap();
        if (line.theta - last.0).abs() < DIRECTIONS_TOLERANCE {
            last.1.push(line);
        } else {
            clusters.push((line.theta, vec![line]));
        }
    }
    // The ends of [0, π) describe the same axis with reversed sign.
    if clusters.len() > 1 {
        let first_angle = clusters[0].0;
        let last_angle = clusters.last().unwrap().0;
        if (first_angle - last_angle + std::f32::consts::PI).abs() < DIRECTIONS_TOLERANCE {
            let wrapped = clusters.pop().unwrap();
            clusters[0].1.extend(
                wrapped
                    .1
                    .iter()
                    .map(|l| Line::new(-l.rho, l.theta - std::f32::consts::PI)),
            );
        }
    }
    let mut axes: Vec<Axis> = clusters
        .into_iter()
        .map(|(_, mut members)| {
            let angle = members.iter().map(|l| l.theta).sum::<f32>() / members.len() as f32;
            members.sort_by(|a, b| a.rho.abs().total_cmp(&b.rho.abs()));
            Axis {
                angle,
                lines: members,
            }
        })
        .collect();
    // A trailing cluster closer to π than the leading one is to 0 is the
    // vertical axis viewed from the other side; rotate it to the front.
    if axes.len() > 1
        && (axes.last().unwrap().angle - std::f32::consts::PI).abs() < axes[0].angle.abs()
    {
        let last = axes.pop().unwrap();
        axes.insert(0, last);
    }
    axes
}

/// Selects the vertical/horizontal axis pair for the given sheet layout.
pub fn detect_axes(lines: &[Line], dims: &[TableDims]) -> Result<AxisPair, AxesFailure> {
    let v_expected = expected_columns(dims);
    let h_expected = expected_rows(dims);
    let min_lines = v_expected.min(h_expected);

    let mut axes: Vec<Axis> = cluster_directions(lines)
        .into_iter()
        .filter(|axis| axis.lines.len() >= min_lines)
        .collect();

    match axes.len() {
        0 | 1 => {
            debug!("axes: only {} plausible cluster(s)", axes.len());
            return Err(AxesFailure::TooFewClusters { found: axes.len() });
        }
        2 => {}
        3 => {
            // Keep the perpendicular pair, drop the spurious third.
            if geometry::angles_perpendicular(axes[0].angle, axes[1].angle) {
                axes.truncate(2);
            } else if geometry::angles_perpendicular(axes[0].angle, axes[2].angle) {
                axes.remove(1);
            } else {
                axes.remove(0);
            }
        }
        4 => {
            // The sheet's rows and columns sit closer to 0 and π/2 than
            // spurious bundles do.
            axes.sort_by(|a, b| {
                let da = geometry::distance_closest_axis(a.angle, &AXIS_ANGLES);
                let db = geometry::distance_closest_axis(b.angle, &AXIS_ANGLES);
                da.total_cmp(&db)
            });
            axes.truncate(2);
            axes.sort_by(|a, b| a.angle.total_cmp(&b.angle));
        }
        n => {
            debug!("axes: {n} plausible clusters, frame too noisy");
            return Err(AxesFailure::TooManyClusters { found: n });
        }
    }

    if !geometry::angles_perpendicular(axes[0].angle, axes[1].angle) {
        debug!(
            "axes: clusters at {:.3} and {:.3} rad are not perpendicular",
            axes[0].angle, axes[1].angle
        );
        return Err(AxesFailure::NotPerpendicular);
    }
    let horizontal = axes.pop().unwrap();
    let vertical = axes.pop().unwrap();
    Ok(AxisPair {
        vertical,
        horizontal,
    })
}

const AXIS_ANGLES: [f32; 2] = [0.0, std::f32::consts::FRAC_PI_2];

/// Drops lines hugging the image borders and collapses near-duplicates.
///
/// When `read_id` is set, two extra horizontal lines (the ID-strip rails)
/// are part of the expected count. If collapsing cannot reach the expected
/// column count the border-filtered axes are returned uncollapsed; the grid
/// reconstructor will reject the frame.
pub fn filter_axes(
    pair: AxisPair,
    dims: &[TableDims],
    image_width: usize,
    image_height: usize,
    read_id: bool,
) -> AxisPair {
    let vertical = Axis {
        angle: pair.vertical.angle,
        lines: border_filter(&pair.vertical.lines, image_width, std::f32::consts::FRAC_PI_2),
    };
    let horizontal = Axis {
        angle: pair.horizontal.angle,
        lines: border_filter(&pair.horizontal.lines, image_height, 0.0),
    };

    let v_expected = expected_columns(dims);
    let mut h_expected = expected_rows(dims);
    if read_id {
        h_expected += 2;
    }
    let Some(hlines) = collapse_lines(&horizontal.lines, h_expected, true) else {
        return AxisPair {
            vertical,
            horizontal,
        };
    };
    let Some(vlines) = collapse_lines(&vertical.lines, v_expected, false) else {
        return AxisPair {
            vertical,
            horizontal,
        };
    };
    AxisPair {
        vertical: Axis {
            angle: vertical.angle,
            lines: vlines,
        },
        horizontal: Axis {
            angle: horizontal.angle,
            lines: hlines,
        },
    }
}

/// Keeps lines whose |rho| stays in the central 3%..97% band of the image
/// extent; lines not perpendicular to `reference_angle` bypass the test.
fn border_filter(lines: &[Line], extent: usize, reference_angle: f32) -> Vec<Line> {
    let extent = extent as f32;
    lines
        .iter()
        .filter(|l| {
            (l.rho.abs() < 0.97 * extent && l.rho.abs() > 0.03 * extent)
                || !geometry::angles_perpendicular(reference_angle, l.theta)
        })
        .copied()
        .collect()
}

/// Merges runs of lines whose rho values are close together.
///
/// A new run starts either at a gap above [`COLLAPSE_MAX_GAP`], or at a
/// medium gap (>= 5) when the theta ordering says the next line is locally
/// ahead (increasing for rows, decreasing for columns). Returns `None` when
/// fewer than two lines are given, or when columns do not collapse to the
/// exact expected count. Rows may exceed the expectation; the grid
/// reconstructor trims extras near the top.
pub fn collapse_lines(lines: &[Line], expected: usize, horizontal: bool) -> Option<Vec<Line>> {
    if lines.len() < 2 {
        return None;
    }
    let mut collapsed = Vec::new();
    let mut sum_rho = lines[0].rho;
    let mut sum_theta = lines[0].theta;
    let mut run = 1usize;
    let mut last = lines[0];
    for &line in &lines[1..] {
        let gap = (line.rho - last.rho).abs();
        let ahead = if horizontal {
            line.theta > last.theta
        } else {
            line.theta < last.theta
        };
        if (ahead && gap >= 5.0) || gap > COLLAPSE_MAX_GAP {
            collapsed.push(Line::new(sum_rho / run as f32, sum_theta / run as f32));
            sum_rho = line.rho;
            sum_theta = line.theta;
            run = 1;
        } else {
            sum_rho += line.rho;
            sum_theta += line.theta;
            run += 1;
        }
        last = line;
    }
    collapsed.push(Line::new(sum_rho / run as f32, sum_theta / run as f32));
    if horizontal || collapsed.len() == expected {
        Some(collapsed)
    } else {
        debug!(
            "collapse: {} column lines, expected {expected}",
            collapsed.len()
        );
        None
    }
}
