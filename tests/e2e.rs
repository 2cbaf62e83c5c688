//! End-to-end detection over synthetically printed sheets.

mod common;

use common::synthetic_sheet as sheet;
use omr_detector::{
    encode_model, DetectorOptions, RetryContext, SheetDetector, TableDims,
};

/// Every printed stroke on the synthetic sheets clears this vote count.
const THRESHOLD: u32 = 200;

fn options() -> DetectorOptions {
    DetectorOptions {
        dims: vec![TableDims::new(
            sheet::NUM_CHOICES as u32,
            sheet::NUM_QUESTIONS as u32,
        )],
        ..DetectorOptions::default()
    }
}

fn detector(options: DetectorOptions) -> SheetDetector {
    let _ = env_logger::builder().is_test(true).try_init();
    SheetDetector::new(options).with_context(RetryContext::fixed(THRESHOLD))
}

#[test]
fn reads_answers_from_the_grid() {
    let mut buf = sheet::blank_sheet();
    sheet::draw_grid(&mut buf);
    sheet::draw_cross(&mut buf, 0, 2);
    sheet::draw_cross(&mut buf, 2, 0);
    sheet::draw_cross(&mut buf, 2, 1);

    let mut detector = detector(options());
    let result = detector.process(&buf.as_view());

    assert!(result.success);
    assert!(result.status.lines && result.status.axes && result.status.grid);
    assert!(result.status.marks);
    assert!(!result.status.id_rails && !result.status.id_box);
    let mut expected = vec![0i32; sheet::NUM_QUESTIONS];
    expected[0] = 3;
    expected[2] = -1;
    assert_eq!(result.answers, expected);
    assert_eq!(result.model, None);
    assert_eq!(result.student_id, None);
    assert_eq!(result.progress, 1.0);
    assert_eq!(result.threshold, THRESHOLD);
}

#[test]
fn decodes_the_sheet_model() {
    let mut buf = sheet::blank_sheet();
    sheet::draw_grid(&mut buf);
    let bits = encode_model('A', sheet::NUM_CHOICES).unwrap();
    sheet::draw_infobits(&mut buf, &bits);

    let mut detector = detector(DetectorOptions {
        read_infobits: true,
        ..options()
    });
    let result = detector.process(&buf.as_view());

    assert!(result.success);
    assert_eq!(result.model, Some('A'));
    assert!(result.answers.iter().all(|&a| a == 0));
}

#[test]
fn missing_model_circles_fail_the_frame_but_not_the_marks() {
    let mut buf = sheet::blank_sheet();
    sheet::draw_grid(&mut buf);

    let mut detector = detector(DetectorOptions {
        read_infobits: true,
        ..options()
    });
    let result = detector.process(&buf.as_view());

    assert!(!result.success);
    assert_eq!(result.model, None);
    assert!(result.status.grid);
    // Mark decisions themselves went through; only the model is missing.
    assert!(result.status.marks);
    assert_eq!(result.progress, 0.8);
}

#[test]
fn full_sheet_with_student_id() {
    let mut buf = sheet::blank_sheet();
    sheet::draw_grid(&mut buf);
    sheet::draw_cross(&mut buf, 0, 0);
    let bits = encode_model('A', sheet::NUM_CHOICES).unwrap();
    sheet::draw_infobits(&mut buf, &bits);
    sheet::draw_id_box(&mut buf);

    let mut detector = detector(DetectorOptions {
        read_infobits: true,
        read_id: true,
        id_num_digits: sheet::NUM_DIGITS,
        capture_overlay: true,
        ..options()
    });
    let result = detector.process(&buf.as_view());

    assert!(result.success);
    assert_eq!(result.model, Some('A'));
    assert!(result.status.id_rails && result.status.id_box);
    assert_eq!(result.student_id.as_deref(), Some("11111111"));
    assert_eq!(result.id_scores.len(), sheet::NUM_DIGITS);
    assert_eq!(result.answers[0], 1);
    assert_eq!(result.progress, 1.0);

    let overlay = result.overlay.expect("overlay requested");
    assert_eq!(overlay.vertical_lines.len(), sheet::NUM_CHOICES + 1);
    // Table rows plus the two ID rails.
    assert_eq!(overlay.horizontal_lines.len(), sheet::NUM_QUESTIONS + 3);
    assert_eq!(overlay.id_rails.len(), 2);
    assert_eq!(overlay.id_corners.len(), 4 * sheet::NUM_DIGITS);
}

#[test]
fn repeated_frames_keep_a_locked_threshold() {
    let _ = env_logger::builder().is_test(true).try_init();
    let buf = sheet::blank_sheet();
    let mut detector = SheetDetector::new(options());
    detector.lock_threshold();
    let first = detector.context().current_threshold();
    for _ in 0..30 {
        detector.process(&buf.as_view());
    }
    assert_eq!(detector.context().current_threshold(), first);
}
