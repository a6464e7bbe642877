//! Subtitle preparation for rendering.
//!
//! - Equalize cue lengths so each burned-in caption stays short
//! - Rewrite SRT files in place for external tooling

mod equalize;

use std::path::Path;

use anyhow::Result;

pub use equalize::equalize_cues;

use super::srt::{SubtitleCue, read_srt_file, write_srt_file};

/// Equalize an SRT file; `input` and `output` may be the same path.
pub fn equalize_srt_file(
    input: &Path,
    output: &Path,
    max_chars: usize,
) -> Result<Vec<SubtitleCue>> {
    let cues = read_srt_file(input)?;
    let equalized = equalize_cues(&cues, max_chars)?;
    write_srt_file(output, &equalized)?;
    Ok(equalized)
}
