use omr_detector::image::ImageU8;
use omr_detector::{DetectorOptions, SheetDetector, TableDims};

fn main() {
    // Demo stub: creates a fake 8-bit image buffer and runs the detector
    let w = 640usize;
    let h = 480usize;
    let stride = w; // tightly packed
    let gray = vec![0u8; w * h];
    let img = ImageU8 {
        w,
        h,
        stride,
        data: &gray,
    };

    let options = DetectorOptions {
        dims: vec![TableDims::new(4, 10), TableDims::new(4, 10)],
        read_infobits: true,
        ..Default::default()
    };
    let mut detector = SheetDetector::new(options);
    let res = detector.process(&img);
    println!(
        "success={} progress={:.2} threshold={}",
        res.success, res.progress, res.threshold
    );
}
