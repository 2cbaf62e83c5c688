//! Unexpected internal failures.
//!
//! Expected detection failures (no grid on this frame, invalid info-bits)
//! are communicated through status flags, never through this type. A
//! `DetectError` means an input invariant was broken or an arithmetic edge
//! case was hit; the calling loop should log it and discard the frame.

use crate::geometry::Line;

#[derive(Clone, Debug, PartialEq)]
pub enum DetectError {
    /// The sheet layout holds no answer tables.
    EmptyLayout,
    /// Two accepted axis lines turned out near-parallel when intersected.
    DegenerateIntersection { hline: Line, vline: Line },
}

impl std::fmt::Display for DetectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectError::EmptyLayout => write!(f, "sheet layout holds no answer tables"),
            DetectError::DegenerateIntersection { hline, vline } => write!(
                f,
                "degenerate intersection of ({:.1}, {:.3}) and ({:.1}, {:.3})",
                hline.rho, hline.theta, vline.rho, vline.theta
            ),
        }
    }
}

impl std::error::Error for DetectError {}
