//! Adaptive retry policy for the Hough sensitivity threshold.
//!
//! A threshold that works under one lighting condition systematically fails
//! under another. Instead of asking the operator to tune it, the context
//! cycles through a fixed candidate list whenever too many consecutive
//! frames fail, trading a multi-frame convergence time for hands-off
//! robustness. Retries are always across frames; the same frame is never
//! re-detected.

use serde::{Deserialize, Serialize};

/// Candidate Hough thresholds, strictest first.
pub const DEFAULT_THRESHOLDS: [u32; 10] = [280, 260, 240, 225, 210, 195, 180, 160, 140, 120];
/// Consecutive failures tolerated before advancing to the next threshold.
pub const FAILURES_BOUND: u32 = 10;

/// Session-lifetime detection state: threshold cycling and failure count.
///
/// Created once per grading session and mutated in place between
/// sequential frames; never shared across concurrent detection passes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryContext {
    thresholds: Vec<u32>,
    index: usize,
    failures_in_a_row: u32,
    locked: bool,
}

impl Default for RetryContext {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLDS.to_vec())
    }
}

impl RetryContext {
    /// Context cycling over the given candidate list.
    pub fn new(thresholds: Vec<u32>) -> Self {
        assert!(!thresholds.is_empty(), "at least one threshold required");
        Self {
            thresholds,
            index: 0,
            failures_in_a_row: 0,
            locked: false,
        }
    }

    /// Context pinned to a single threshold (never cycles).
    pub fn fixed(threshold: u32) -> Self {
        Self::new(vec![threshold])
    }

    /// The threshold to use for the next frame.
    pub fn current_threshold(&self) -> u32 {
        self.thresholds[self.index]
    }

    pub fn failures_in_a_row(&self) -> u32 {
        self.failures_in_a_row
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Records a failed frame; advances the threshold once the failure
    /// bound is exceeded.
    pub fn notify_failure(&mut self) {
        self.failures_in_a_row += 1;
        if self.failures_in_a_row > FAILURES_BOUND {
            self.next_threshold();
        }
    }

    /// Records a successful frame; the threshold stays put.
    pub fn notify_success(&mut self) {
        self.failures_in_a_row = 0;
    }

    /// Advances to the next candidate threshold (wrapping) unless locked.
    pub fn next_threshold(&mut self) {
        if !self.locked {
            self.index = (self.index + 1) % self.thresholds.len();
            self.failures_in_a_row = 0;
        }
    }

    /// Freezes the current threshold, e.g. once a sheet has been
    /// confidently identified.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Resumes threshold cycling and clears the failure count.
    pub fn unlock(&mut self) {
        self.locked = false;
        self.failures_in_a_row = 0;
    }
}
