//! I/O helpers for grayscale images and JSON reports.
//!
//! - [`load_grayscale_image`]: read a PNG/JPEG into an owned 8-bit buffer.
//! - [`save_grayscale_u8`]: write an owned 8-bit buffer to a PNG.
//! - [`write_json_file`]: pretty-print a serializable value to disk.

use super::GrayBuffer;
use image::GrayImage;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Loads an image file and converts it to 8-bit grayscale.
pub fn load_grayscale_image(path: &Path) -> Result<GrayBuffer, String> {
    let dynamic = image::open(path)
        .map_err(|e| format!("Failed to open image {}: {e}", path.display()))?;
    let gray = dynamic.into_luma8();
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    Ok(GrayBuffer::new(w, h, gray.into_raw()))
}

/// Writes an owned grayscale buffer to a PNG file.
pub fn save_grayscale_u8(path: &Path, buffer: &GrayBuffer) -> Result<(), String> {
    let img = GrayImage::from_raw(
        buffer.width() as u32,
        buffer.height() as u32,
        buffer.as_view().data.to_vec(),
    )
    .ok_or_else(|| "Buffer size does not match dimensions".to_string())?;
    img.save(path)
        .map_err(|e| format!("Failed to save image {}: {e}", path.display()))
}

/// Serializes `value` as pretty JSON into `path`.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON: {e}"))?;
    fs::write(path, json).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}
