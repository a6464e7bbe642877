//! Render Timeline Module
//!
//! The image track of a short is a flat list of still-image slices played
//! back to back. The list is built by tiling the generated images over the
//! narration:
//! 1. Every image gets `narration / image_count` seconds
//! 2. The image list repeats from the start until the narration is covered
//! 3. The compositor trims the result to the narration length

use std::path::PathBuf;
use std::time::Duration;

use crate::video::error::RenderError;

/// A still image shown for a fixed amount of time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlice {
    pub image: PathBuf,
    pub duration: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSequence {
    pub slices: Vec<ImageSlice>,
}

impl ImageSequence {
    pub fn total_duration(&self) -> Duration {
        self.slices.iter().map(|slice| slice.duration).sum()
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Start offset of every slice in the final video
    pub fn start_times(&self) -> Vec<Duration> {
        let mut elapsed = Duration::ZERO;
        self.slices
            .iter()
            .map(|slice| {
                let start = elapsed;
                elapsed += slice.duration;
                start
            })
            .collect()
    }

    /// Cut the sequence so it ends exactly at `target`.
    ///
    /// Slices starting at or after `target` are dropped and the slice that
    /// straddles it is shortened.
    pub fn trim_to(&self, target: Duration) -> ImageSequence {
        let mut trimmed = Vec::with_capacity(self.slices.len());
        let mut elapsed = Duration::ZERO;

        for slice in &self.slices {
            if elapsed >= target {
                break;
            }
            let remaining = target - elapsed;
            let duration = slice.duration.min(remaining);
            trimmed.push(ImageSlice {
                image: slice.image.clone(),
                duration,
            });
            elapsed += duration;
        }

        ImageSequence { slices: trimmed }
    }
}

/// Repeat `images` in order until their slices cover `target`.
pub fn tile_images(images: &[PathBuf], target: Duration) -> Result<ImageSequence, RenderError> {
    if images.is_empty() {
        return Err(RenderError::invalid(
            "no images supplied; at least one image is required to build a video",
        ));
    }
    if target.is_zero() {
        return Err(RenderError::invalid("narration duration is zero"));
    }

    let per_image = slice_duration(target, images.len())?;

    let mut slices = Vec::new();
    let mut total = Duration::ZERO;
    while total < target {
        for image in images {
            slices.push(ImageSlice {
                image: image.clone(),
                duration: per_image,
            });
            total += per_image;
        }
    }

    Ok(ImageSequence { slices })
}

/// `target / count` rounded up to the next nanosecond, so one pass always
/// reaches the target.
fn slice_duration(target: Duration, count: usize) -> Result<Duration, RenderError> {
    let count = count as u128;
    let nanos = target.as_nanos().div_ceil(count);
    let nanos = u64::try_from(nanos)
        .map_err(|_| RenderError::invalid("narration duration is too long to tile"))?;
    Ok(Duration::from_nanos(nanos))
}
