//! The detection pipeline: one call per captured frame, from raw Hough
//! lines to answers, model and student ID.
//!
//! A [`SheetDetector`] owns the session state (threshold cycling, the digit
//! classifier) and is driven frame by frame. A frame that fails any stage
//! produces a cheap, silent result with partial status flags; only
//! unexpected internal errors surface as [`DetectError`].

pub mod params;

use crate::axes;
use crate::error::DetectError;
use crate::grid;
use crate::hough;
use crate::idbox;
use crate::image::ImageU8;
use crate::infobits;
use crate::marks;
use crate::ocr::{CrossingsClassifier, DigitClassifier};
use crate::retry::RetryContext;
use crate::types::{total_questions, DetectionStatus, Overlay, SheetResult};
use log::{debug, warn};

pub use params::{DetectionParams, DetectorOptions};

/// Frame-by-frame sheet detector for one grading session.
pub struct SheetDetector {
    options: DetectorOptions,
    params: DetectionParams,
    context: RetryContext,
    classifier: Box<dyn DigitClassifier>,
}

impl SheetDetector {
    pub fn new(options: DetectorOptions) -> Self {
        Self {
            options,
            params: DetectionParams::default(),
            context: RetryContext::default(),
            classifier: Box::new(CrossingsClassifier),
        }
    }

    pub fn with_params(mut self, params: DetectionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_context(mut self, context: RetryContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn DigitClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn options(&self) -> &DetectorOptions {
        &self.options
    }

    pub fn context(&self) -> &RetryContext {
        &self.context
    }

    /// Freezes the current threshold, e.g. after a confident detection.
    pub fn lock_threshold(&mut self) {
        self.context.lock();
    }

    pub fn unlock_threshold(&mut self) {
        self.context.unlock();
    }

    /// Processes one frame, absorbing internal errors into a failed result.
    ///
    /// This is the entry point for the live grading loop: structured
    /// failures stay silent, unexpected errors are logged once and the
    /// frame is discarded.
    pub fn process(&mut self, image: &ImageU8) -> SheetResult {
        let threshold = self.context.current_threshold();
        match self.try_process(image) {
            Ok(result) => {
                if result.success {
                    self.context.notify_success();
                } else {
                    self.context.notify_failure();
                }
                result
            }
            Err(err) => {
                warn!("frame discarded at threshold {threshold}: {err}");
                self.context.notify_failure();
                SheetResult {
                    threshold,
                    ..SheetResult::default()
                }
            }
        }
    }

    /// Processes one frame, surfacing internal errors to the caller.
    pub fn try_process(&mut self, image: &ImageU8) -> Result<SheetResult, DetectError> {
        if self.options.dims.is_empty() {
            return Err(DetectError::EmptyLayout);
        }
        let threshold = self.context.current_threshold();
        let mut result = SheetResult {
            threshold,
            ..SheetResult::default()
        };
        let dims = &self.options.dims;

        let lines = hough::detect_lines(image, threshold);
        if lines.len() < 2 {
            debug!("detect: {} raw lines at threshold {threshold}", lines.len());
            self.context.next_threshold();
            result.progress = compute_progress(&result.status, false, &self.options);
            return Ok(result);
        }
        result.status.lines = true;

        let pair = match axes::detect_axes(&lines, dims) {
            Ok(pair) => pair,
            Err(failure) => {
                debug!("detect: {failure} at threshold {threshold}");
                self.context.next_threshold();
                result.progress = compute_progress(&result.status, false, &self.options);
                return Ok(result);
            }
        };
        result.status.axes = true;
        let pair = axes::filter_axes(
            pair,
            dims,
            image.width(),
            image.height(),
            self.options.read_id,
        );
        let hlines = &pair.horizontal.lines;
        let vlines = &pair.vertical.lines;

        let matrices = grid::cell_corners(hlines, vlines, image.width(), image.height(), dims)?;
        if matrices.is_empty() {
            result.progress = compute_progress(&result.status, false, &self.options);
            return Ok(result);
        }
        result.status.grid = true;

        let cells = grid::answer_cells(&matrices, dims, self.options.left_to_right_numbering);
        debug_assert_eq!(cells.len(), total_questions(dims));
        result.answers = marks::decide_cells(image, &cells, &self.params.marks);
        result.status.marks = true;

        let mut model_ok = true;
        if self.options.read_infobits {
            result.model = infobits::read_infobits(image, &matrices, &self.params.infobits)
                .and_then(|bits| infobits::decode_model(&bits, self.options.accept_model_0));
            model_ok = result.model.is_some();
        }

        let mut id_box = None;
        if model_ok && self.options.read_id {
            if let Some(rails) = idbox::select_id_rails(hlines, dims) {
                result.status.id_rails = true;
                id_box = idbox::locate_id_box(
                    image,
                    (rails.0, rails.1),
                    self.options.id_num_digits,
                    &self.params.idbox,
                );
                if let Some(id_box) = &id_box {
                    result.status.id_box = true;
                    let mut digits = String::with_capacity(id_box.cells.len());
                    for cell in &id_box.cells {
                        let decision = self.classifier.classify(image, cell);
                        digits.push(match decision.digit {
                            Some(d) => (b'0' + d) as char,
                            None => '0',
                        });
                        result.id_scores.push(decision.scores);
                    }
                    result.student_id = Some(digits);
                }
            }
        }

        result.success =
            result.status.marks && model_ok && (!self.options.read_id || result.status.id_box);
        if self.options.capture_overlay {
            let mut overlay = Overlay {
                vertical_lines: vlines.clone(),
                horizontal_lines: hlines.clone(),
                ..Overlay::default()
            };
            for matrix in &matrices {
                for row in matrix.rows() {
                    overlay.cell_corners.extend_from_slice(row);
                }
            }
            if let Some(id_box) = &id_box {
                overlay.id_rails = id_box.rails.to_vec();
                overlay.id_corners = id_box
                    .cells
                    .iter()
                    .flat_map(|c| c.corners())
                    .collect();
            }
            result.overlay = Some(overlay);
        }
        result.progress = compute_progress(&result.status, model_ok, &self.options);
        Ok(result)
    }
}

/// Fraction of the enabled stages this pass completed.
fn compute_progress(status: &DetectionStatus, model_ok: bool, options: &DetectorOptions) -> f32 {
    let mut achieved = [status.lines, status.axes, status.grid, status.marks]
        .iter()
        .filter(|&&b| b)
        .count();
    let mut total = 4;
    if options.read_infobits {
        total += 1;
        achieved += usize::from(model_ok);
    }
    if options.read_id {
        total += 2;
        achieved += usize::from(status.id_rails) + usize::from(status.id_box);
    }
    achieved as f32 / total as f32
}
