// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for frame operations
//!
//! This module provides command-line functionality for:
//! - Loading frames from image files or raw pixel dumps
//! - Encoding frames to JPEG/PNG
//! - Detecting barcodes and printing them as JSON

use frame_engine::{
    BarcodeFormat, CaptureOptions, DetectionOptions, EngineConfig, Frame, FrameEngine, FrameError,
    PixelFormat,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Frame source as given on the command line
pub struct InputSpec {
    pub path: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
    pub stride: Option<usize>,
}

/// Pixels loaded from disk, owned for the lifetime of the command
pub struct LoadedFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
}

impl LoadedFrame {
    /// Borrowed frame over the loaded pixels
    pub fn frame(&self) -> Result<Frame<'_>, FrameError> {
        Frame::contiguous(&self.data, self.width, self.height, self.stride, self.format)
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg" | "bmp"))
        .unwrap_or(false)
}

/// Load a frame from an image file or a raw dump
pub fn load_input(input: &InputSpec) -> Result<LoadedFrame, Box<dyn std::error::Error>> {
    if is_image_file(&input.path) {
        let image = image::open(&input.path)?.into_rgb8();
        let (width, height) = image.dimensions();
        debug!(path = %input.path.display(), width, height, "Decoded input image");
        return Ok(LoadedFrame {
            data: image.into_raw(),
            width,
            height,
            stride: width as usize * 3,
            format: PixelFormat::RGB24,
        });
    }

    let (Some(width), Some(height)) = (input.width, input.height) else {
        return Err("Raw input needs --width and --height".into());
    };
    let name = input.format.as_deref().ok_or("Raw input needs --format")?;
    let format =
        PixelFormat::from_fourcc(name).ok_or_else(|| format!("Unknown pixel format: {}", name))?;
    let stride = input
        .stride
        .unwrap_or_else(|| format.plane_geometry(0, width, height).0);

    let data = std::fs::read(&input.path)?;
    debug!(
        path = %input.path.display(),
        width,
        height,
        %format,
        stride,
        bytes = data.len(),
        "Loaded raw frame"
    );
    Ok(LoadedFrame {
        data,
        width,
        height,
        stride,
        format,
    })
}

/// Encode the frame and write or print the result
pub fn capture(
    source: &LoadedFrame,
    options: &CaptureOptions,
    output: Option<PathBuf>,
    print_base64: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = FrameEngine::default();
    let result = engine.try_capture(&source.frame()?, options)?;

    if let Some(path) = output {
        std::fs::write(&path, &result.encoded_bytes)?;
        info!(path = %path.display(), size = result.size, "Capture written");
        println!("Image saved: {}", path.display());
    }

    if print_base64 {
        println!("{}", result.base64);
    } else {
        println!(
            "{}x{} {} ({} bytes)",
            result.width,
            result.height,
            result.format.extension(),
            result.size
        );
    }
    Ok(())
}

/// Detect barcodes and print the result as JSON
pub fn detect(
    source: &LoadedFrame,
    format_names: &[String],
    options: &DetectionOptions,
    config: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let formats = format_names
        .iter()
        .map(|name| name.parse::<BarcodeFormat>())
        .collect::<Result<Vec<_>, _>>()?;

    let config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let engine = FrameEngine::new(config);
    let result = engine.try_detect(&source.frame()?, &formats, options)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
