use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{GenericImageView, ImageFormat, ImageReader};

use crate::ui::prelude::{Level, emit};
use crate::video::error::RenderError;

/// Output frame of every render (Reels/TikTok/Shorts 9:16 vertical)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetFrame {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for TargetFrame {
    fn default() -> Self {
        Self::PORTRAIT
    }
}

impl TargetFrame {
    pub const PORTRAIT: TargetFrame = TargetFrame {
        width: 1080,
        height: 1920,
        fps: 30,
    };

    /// width / height, 0.5625 for portrait
    pub fn ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Region of the source image kept before scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Center-anchored crop of a `width`×`height` source to the frame ratio.
    ///
    /// Sources at or below the target ratio lose height, wider sources lose
    /// width. The ratio is compared at four decimals.
    pub fn for_source(width: u32, height: u32, frame: TargetFrame) -> CropRect {
        let target_ratio = frame.ratio();
        let source_ratio = round4(f64::from(width) / f64::from(height));

        if source_ratio <= target_ratio {
            let crop_height = ((f64::from(width) / target_ratio).round() as u32).clamp(1, height);
            CropRect {
                x: 0,
                y: (height - crop_height) / 2,
                width,
                height: crop_height,
            }
        } else {
            let crop_width = ((target_ratio * f64::from(height)).round() as u32).clamp(1, width);
            CropRect {
                x: (width - crop_width) / 2,
                y: 0,
                width: crop_width,
                height,
            }
        }
    }

    pub fn crops_height(&self, source_height: u32) -> bool {
        self.height < source_height
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Crop and scale `source` to the frame, writing a PNG to `destination`.
pub fn normalize_image(
    source: &Path,
    destination: &Path,
    frame: TargetFrame,
) -> Result<CropRect, RenderError> {
    let decode_error = |err: &dyn std::fmt::Display| {
        RenderError::failure(format!("cannot decode image {}: {err}", source.display()))
    };
    let decoded = ImageReader::open(source)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|err| decode_error(&err))?
        .decode()
        .map_err(|err| decode_error(&err))?;

    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::failure(format!(
            "image {} has no pixels",
            source.display()
        )));
    }

    let crop = CropRect::for_source(width, height, frame);
    emit(
        Level::Debug,
        "render.crop",
        &format!(
            "{} ({width}x{height}): cropping {} to {}x{} at ({}, {})",
            source.display(),
            if crop.crops_height(height) { "height" } else { "width" },
            crop.width,
            crop.height,
            crop.x,
            crop.y
        ),
        None,
    );
    let normalized = decoded
        .crop_imm(crop.x, crop.y, crop.width, crop.height)
        .resize_exact(frame.width, frame.height, FilterType::Lanczos3);

    normalized
        .save_with_format(destination, ImageFormat::Png)
        .map_err(|err| {
            RenderError::failure(format!(
                "cannot write normalized frame {}: {err}",
                destination.display()
            ))
        })?;

    Ok(crop)
}

/// Normalize every distinct image once; returns `(source, frame)` pairs in
/// first-seen order.
pub fn normalize_all(
    images: &[PathBuf],
    frame: TargetFrame,
    mut destination_for: impl FnMut(&Path) -> PathBuf,
) -> Result<Vec<(PathBuf, PathBuf)>, RenderError> {
    let mut normalized: Vec<(PathBuf, PathBuf)> = Vec::new();
    for image in images {
        if normalized.iter().any(|(source, _)| source == image) {
            continue;
        }
        let destination = destination_for(image);
        normalize_image(image, &destination, frame)?;
        normalized.push((image.clone(), destination));
    }
    Ok(normalized)
}
