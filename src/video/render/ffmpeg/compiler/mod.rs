mod audio;
mod inputs;
mod overlays;
mod util;
mod video;


use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use self::inputs::SourceMap;
use self::util::format_time;
use crate::video::config::RenderSettings;
use crate::video::error::RenderError;
use crate::video::render::frame::TargetFrame;
use crate::video::render::timeline::ImageSequence;
use crate::video::support::ffmpeg::PROFILE_H264_AAC_FASTSTART;

#[derive(Debug, Clone)]
pub struct FfmpegCompileOutput {
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: String) {
        self.filters.push(filter);
    }

    pub fn join(&self) -> String {
        self.filters.join("; ")
    }
}

/// How burned-in subtitles look
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleStyle {
    pub font_file: PathBuf,
    pub font_size: u32,
    pub font_color: String,
    pub outline_color: String,
    pub outline_thickness: u32,
}

impl SubtitleStyle {
    pub fn from_settings(settings: &RenderSettings, font_file: PathBuf) -> Self {
        Self {
            font_file,
            font_size: settings.subtitles_font_size,
            font_color: settings.subtitles_font_color.clone(),
            outline_color: settings.subtitles_outline_color.clone(),
            outline_thickness: settings.subtitles_outline_thickness,
        }
    }
}

/// One subtitle cue whose text has been written to `text_file`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub start: Duration,
    pub end: Duration,
    pub text_file: PathBuf,
}

/// Everything the compositor layers into one video
#[derive(Debug, Clone, Copy)]
pub struct Composition<'a> {
    /// Normalized frames, already trimmed to `duration`
    pub slices: &'a ImageSequence,
    pub captions: &'a [Caption],
    pub audio: &'a Path,
    pub duration: Duration,
}

pub struct FfmpegCompiler {
    frame: TargetFrame,
    style: SubtitleStyle,
    threads: u32,
}

impl FfmpegCompiler {
    pub fn new(frame: TargetFrame, style: SubtitleStyle, threads: u32) -> Self {
        Self {
            frame,
            style,
            threads,
        }
    }

    pub fn compile(&self, output: &Path, composition: &Composition) -> Result<FfmpegCompileOutput> {
        if composition.slices.is_empty() {
            return Err(RenderError::invalid("cannot compose a video without image slices").into());
        }
        if composition.duration.is_zero() {
            return Err(RenderError::invalid("cannot compose a zero-length video").into());
        }

        let mut args = vec!["-y".to_string(), "-hide_banner".to_string()];

        let source_map = SourceMap::build(composition.slices, composition.audio, self.frame.fps);
        args.extend(source_map.input_args());

        let filter_complex = self.build_filter_complex(composition, &source_map)?;
        args.push("-filter_complex".to_string());
        args.push(filter_complex);

        args.push("-map".to_string());
        args.push("[outv]".to_string());
        args.push("-map".to_string());
        args.push("[outa]".to_string());

        PROFILE_H264_AAC_FASTSTART.push_to(&mut args);
        args.push("-r".to_string());
        args.push(self.frame.fps.to_string());
        args.push("-threads".to_string());
        args.push(self.threads.to_string());
        args.push("-t".to_string());
        args.push(format_time(composition.duration));
        args.push(output.to_string_lossy().into_owned());

        Ok(FfmpegCompileOutput { args })
    }

    fn build_filter_complex(
        &self,
        composition: &Composition,
        source_map: &SourceMap,
    ) -> Result<String> {
        let mut filters = FilterChain::new();

        let base_label = self.build_slice_filters(&mut filters, composition.slices, source_map)?;
        let video_label =
            self.apply_captions(&mut filters, composition.captions, composition.duration, &base_label);
        filters.push(format!("[{video_label}]copy[outv]"));

        self.build_audio_filters(&mut filters, source_map, composition.duration)?;

        Ok(filters.join())
    }
}
