//! Runtime configuration for the command-line tools.

use crate::detector::{DetectionParams, DetectorOptions};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Write the full detection result as JSON here.
    pub json_out: Option<PathBuf>,
    /// Write the binarized input image here.
    pub binarized_out: Option<PathBuf>,
}

#[derive(Clone, Deserialize)]
pub struct RuntimeConfig {
    pub input_path: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    pub options: DetectorOptions,
    #[serde(default)]
    pub params: DetectionParams,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}

/// Parses the single config-file argument of the CLI tools.
pub fn parse_cli(program: &str) -> Result<RuntimeConfig, String> {
    let mut args = std::env::args().skip(1);
    let (Some(config_path), None) = (args.next(), args.next()) else {
        return Err(format!("Usage: {program} <config.json>"));
    };
    load_config(Path::new(&config_path))
}
