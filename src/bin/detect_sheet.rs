use omr_detector::config;
use omr_detector::image::binarize::adaptive_threshold;
use omr_detector::image::io::{load_grayscale_image, save_grayscale_u8, write_json_file};
use omr_detector::types::SheetResult;
use omr_detector::SheetDetector;
use std::env;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let program = env::args()
        .next()
        .unwrap_or_else(|| "detect_sheet".to_string());
    let config = config::parse_cli(&program)?;

    let gray = load_grayscale_image(&config.input_path)?;
    let binarized = adaptive_threshold(&gray.as_view());
    if let Some(path) = &config.output.binarized_out {
        save_grayscale_u8(path, &binarized)?;
    }

    let mut detector =
        SheetDetector::new(config.options.clone()).with_params(config.params);
    let result = detector.process(&binarized.as_view());

    print_text_summary(&result);
    if let Some(path) = &config.output.json_out {
        write_json_file(path, &result)?;
        println!("JSON result written to {}", path.display());
    }
    Ok(())
}

fn print_text_summary(result: &SheetResult) {
    println!("Detection summary");
    println!("  success: {}", result.success);
    println!("  progress: {:.2}", result.progress);
    println!("  threshold: {}", result.threshold);
    let s = &result.status;
    println!(
        "  status: lines={} axes={} grid={} marks={} id_rails={} id_box={}",
        s.lines, s.axes, s.grid, s.marks, s.id_rails, s.id_box
    );
    if !result.answers.is_empty() {
        let answers: Vec<String> = result.answers.iter().map(|a| a.to_string()).collect();
        println!("  answers: [{}]", answers.join(", "));
    }
    match result.model {
        Some(model) => println!("  model: {model}"),
        None => println!("  model: not decoded"),
    }
    match &result.student_id {
        Some(id) => println!("  student id: {id}"),
        None => println!("  student id: not detected"),
    }
}
