use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use super::util::format_time;
use crate::video::render::timeline::ImageSequence;

#[derive(Debug, Clone)]
enum InputSource {
    /// A still image looped for `duration`
    Still { path: PathBuf, duration: String },
    Audio(PathBuf),
}

/// Ordered ffmpeg inputs: one looped still per slice, then the audio bed
#[derive(Debug, Clone)]
pub(super) struct SourceMap {
    inputs: Vec<InputSource>,
    fps: u32,
}

impl SourceMap {
    pub(super) fn build(slices: &ImageSequence, audio: &Path, fps: u32) -> Self {
        let mut inputs: Vec<InputSource> = slices
            .slices
            .iter()
            .map(|slice| InputSource::Still {
                path: slice.image.clone(),
                duration: format_time(slice.duration),
            })
            .collect();
        inputs.push(InputSource::Audio(audio.to_path_buf()));
        Self { inputs, fps }
    }

    pub(super) fn input_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for input in &self.inputs {
            match input {
                InputSource::Still { path, duration } => {
                    args.extend([
                        "-loop".to_string(),
                        "1".to_string(),
                        "-framerate".to_string(),
                        self.fps.to_string(),
                        "-t".to_string(),
                        duration.clone(),
                        "-i".to_string(),
                        path.to_string_lossy().into_owned(),
                    ]);
                }
                InputSource::Audio(path) => {
                    args.push("-i".to_string());
                    args.push(path.to_string_lossy().into_owned());
                }
            }
        }
        args
    }

    /// Input index of the still backing slice `slice_index`
    pub(super) fn slice_index(&self, slice_index: usize) -> Result<usize> {
        match self.inputs.get(slice_index) {
            Some(InputSource::Still { .. }) => Ok(slice_index),
            _ => Err(anyhow!("no ffmpeg input for image slice {slice_index}")),
        }
    }

    pub(super) fn audio_index(&self) -> Result<usize> {
        self.inputs
            .iter()
            .position(|input| matches!(input, InputSource::Audio(_)))
            .ok_or_else(|| anyhow!("no ffmpeg input for the audio mix"))
    }
}
