//! Typed configuration of a detection session.

use crate::idbox::IdBoxParams;
use crate::infobits::InfobitParams;
use crate::marks::MarkParams;
use crate::types::TableDims;
use serde::{Deserialize, Serialize};

/// Tunable thresholds of every detection stage.
///
/// The defaults are the values the whole test corpus was calibrated
/// against; override individual fields only with a recalibration in hand.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    pub marks: MarkParams,
    pub infobits: InfobitParams,
    pub idbox: IdBoxParams,
}

/// What a detection session is asked to read, beyond the answer grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorOptions {
    /// Answer-table layout, left to right.
    pub dims: Vec<TableDims>,
    /// Decode the sheet model from the info-bit circles.
    pub read_infobits: bool,
    /// Locate the student ID box and classify its digits.
    pub read_id: bool,
    /// Digit cells in the ID box.
    pub id_num_digits: usize,
    /// Number questions across tables row by row instead of table by table.
    pub left_to_right_numbering: bool,
    /// Attach detected geometry to the result for debug rendering.
    pub capture_overlay: bool,
    /// Accept the reserved all-blank model `'0'`.
    pub accept_model_0: bool,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            dims: Vec::new(),
            read_infobits: false,
            read_id: false,
            id_num_digits: 8,
            left_to_right_numbering: false,
            capture_overlay: false,
            accept_model_0: false,
        }
    }
}
