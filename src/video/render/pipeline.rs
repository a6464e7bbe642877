use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::video::render::ffmpeg::compiler::{
    Caption, Composition, FfmpegCompiler, SubtitleStyle,
};
use crate::video::render::ffmpeg::services::{FfmpegRunOptions, FfmpegRunner};
use crate::video::render::frame::TargetFrame;
use crate::video::render::timeline::ImageSequence;

/// Final ffmpeg pass: frames, captions and the audio mix into one file
pub(super) struct RenderPipeline<'a> {
    output: PathBuf,
    slices: ImageSequence,
    captions: Vec<Caption>,
    audio: PathBuf,
    duration: Duration,
    frame: TargetFrame,
    style: SubtitleStyle,
    threads: u32,
    verbose: bool,
    runner: &'a dyn FfmpegRunner,
}

pub(super) struct RenderPipelineParams<'a> {
    pub(super) output: PathBuf,
    pub(super) slices: ImageSequence,
    pub(super) captions: Vec<Caption>,
    pub(super) audio: PathBuf,
    pub(super) duration: Duration,
    pub(super) frame: TargetFrame,
    pub(super) style: SubtitleStyle,
    pub(super) threads: u32,
    pub(super) verbose: bool,
    pub(super) runner: &'a dyn FfmpegRunner,
}

impl<'a> RenderPipeline<'a> {
    pub(super) fn new(params: RenderPipelineParams<'a>) -> Self {
        Self {
            output: params.output,
            slices: params.slices,
            captions: params.captions,
            audio: params.audio,
            duration: params.duration,
            frame: params.frame,
            style: params.style,
            threads: params.threads,
            verbose: params.verbose,
            runner: params.runner,
        }
    }

    pub(super) fn print_command(&self) -> Result<()> {
        let args = self.build_args()?;
        println!("ffmpeg command that would be executed:");
        println!("ffmpeg {}", shell_join(&args));
        Ok(())
    }

    pub(super) fn execute(&self) -> Result<()> {
        let args = self.build_args()?;
        self.runner.run(
            &args,
            FfmpegRunOptions::new(Some(self.duration), self.verbose),
        )
    }

    fn build_args(&self) -> Result<Vec<String>> {
        let compiler = FfmpegCompiler::new(self.frame, self.style.clone(), self.threads);
        let composition = Composition {
            slices: &self.slices,
            captions: &self.captions,
            audio: &self.audio,
            duration: self.duration,
        };
        Ok(compiler.compile(&self.output, &composition)?.args)
    }
}

/// Quote arguments so the printed command can be pasted into a shell
fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if !arg.is_empty()
                && arg
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-_./:+=,".contains(c))
            {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', "'\\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
