#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod detector;
pub mod error;
pub mod image;
pub mod retry;
pub mod types;

// Stage-level modules - public, but considered unstable internals.
pub mod axes;
pub mod geometry;
pub mod grid;
pub mod hough;
pub mod idbox;
pub mod infobits;
pub mod marks;
pub mod ocr;

// --- High-level re-exports -------------------------------------------------

// Main entry points: detector + results.
pub use crate::detector::{DetectionParams, DetectorOptions, SheetDetector};
pub use crate::types::{DetectionStatus, SheetResult, TableDims};

pub use crate::error::DetectError;
pub use crate::retry::RetryContext;

// Model codec helpers, useful when generating sheets.
pub use crate::infobits::{decode_model, encode_model};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
pub mod prelude {
    pub use crate::image::ImageU8;
    pub use crate::{DetectorOptions, SheetDetector, SheetResult, TableDims};
}
