mod ffmpeg;
pub mod frame;
mod logging;
mod output;
pub mod paths;
mod pipeline;
pub mod timeline;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;

use crate::ui::prelude::Level;

use self::ffmpeg::compiler::{Caption, SubtitleStyle};
pub use self::ffmpeg::services::{
    AudioServices, FfmpegRunOptions, FfmpegRunner, SystemAudioServices, SystemFfmpegRunner,
};
use self::frame::{TargetFrame, normalize_all};
use self::logging::{log_event, log_event_with_data};
use self::output::{OutputGuard, prepare_output_destination};
use self::pipeline::{RenderPipeline, RenderPipelineParams};
use self::timeline::{ImageSequence, ImageSlice, tile_images};
use super::config::RenderSettings;
use super::error::RenderError;
use super::fetch::ImageResolver;
use super::music::MusicSource;
use super::scratch::{DOWNLOADS_DIR, Scratch};
use super::srt::{SubtitleCue, read_srt_file};
use super::subtitles::equalize_cues;
use super::support::utils::canonicalize_existing;

/// One video request; consumed by a single render
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Local paths or http(s) URLs, in display order
    pub images: Vec<String>,
    pub narration: PathBuf,
    pub subtitles: PathBuf,
    pub output: Option<PathBuf>,
    pub music: MusicSource,
    pub force: bool,
    pub dry_run: bool,
}

/// External tools a render talks to
pub struct RenderServices<'a> {
    pub runner: &'a dyn FfmpegRunner,
    pub audio: &'a dyn AudioServices,
}

/// Directories a render reads from and writes to
#[derive(Debug, Clone)]
pub struct RenderLocations {
    pub scratch_root: PathBuf,
    pub renders_dir: PathBuf,
    pub base_dir: PathBuf,
}

impl RenderLocations {
    pub fn from_environment() -> Result<Self> {
        Ok(Self {
            scratch_root: crate::common::paths::scratch_dir()?,
            renders_dir: crate::common::paths::renders_dir()?,
            base_dir: std::env::current_dir().context("Failed to read current directory")?,
        })
    }
}

pub fn handle_render(request: RenderRequest, settings: &RenderSettings) -> Result<Option<PathBuf>> {
    let services = RenderServices {
        runner: &SystemFfmpegRunner,
        audio: &SystemAudioServices,
    };
    let locations = RenderLocations::from_environment()?;
    render_with_services(request, settings, &locations, &services)
}

/// Inputs that passed validation, all local and existing
struct ResolvedInputs {
    images: Vec<PathBuf>,
    narration: PathBuf,
    subtitles: PathBuf,
    /// Parsed cues, not yet equalized
    cues: Vec<SubtitleCue>,
    font: PathBuf,
    music: Option<PathBuf>,
}

fn resolve_inputs(
    request: &RenderRequest,
    settings: &RenderSettings,
    locations: &RenderLocations,
) -> Result<ResolvedInputs> {
    log_event(
        Level::Info,
        "inputs",
        format!("Checking {} image(s), narration, subtitles and font", request.images.len()),
    );

    let resolver = ImageResolver::new(
        locations.scratch_root.join(DOWNLOADS_DIR),
        settings.retry_policy(),
    );
    let images = resolver.resolve_all(&request.images)?;
    let narration = canonicalize_existing(&request.narration)
        .with_context(|| "Narration audio is missing")?;
    let subtitles =
        canonicalize_existing(&request.subtitles).with_context(|| "Subtitle file is missing")?;
    let cues = read_srt_file(&subtitles)?;
    let font = canonicalize_existing(&settings.font_path())
        .with_context(|| "Subtitle font is missing")?;
    let music = request
        .music
        .resolve(&mut rand::thread_rng())
        .with_context(|| "Background music is unavailable")?;

    if let Some(song) = &music {
        log_event(
            Level::Info,
            "music",
            format!("Background track: {}", song.display()),
        );
    }

    Ok(ResolvedInputs {
        images,
        narration,
        subtitles,
        cues,
        font,
        music,
    })
}

pub fn render_with_services(
    request: RenderRequest,
    settings: &RenderSettings,
    locations: &RenderLocations,
    services: &RenderServices,
) -> Result<Option<PathBuf>> {
    log_event(Level::Info, "start", "Preparing render");
    settings.validate()?;

    let inputs = resolve_inputs(&request, settings, locations)?;

    let output_path = paths::resolve_output_path(
        request.output.as_deref(),
        &locations.base_dir,
        || Ok(locations.renders_dir.clone()),
    )?;
    if !request.dry_run {
        let mut protected: Vec<&Path> = inputs.images.iter().map(PathBuf::as_path).collect();
        protected.extend([inputs.narration.as_path(), inputs.subtitles.as_path()]);
        if let Some(song) = &inputs.music {
            protected.push(song);
        }
        prepare_output_destination(&output_path, request.force, &protected)?;
    }

    let scratch = Scratch::create(&locations.scratch_root)?;
    log_event(
        Level::Debug,
        "scratch",
        format!("Scratch directory: {}", scratch.path().display()),
    );

    let frame = TargetFrame::PORTRAIT;

    let duration = services.audio.probe_duration(&inputs.narration)?;
    log_event(
        Level::Info,
        "probe",
        format!("Narration lasts {:.3}s", duration.as_secs_f64()),
    );

    let sequence = tile_images(&inputs.images, duration)?;
    let trimmed = sequence.trim_to(duration);
    log_event_with_data(
        Level::Info,
        "tile",
        format!(
            "Tiled {} image(s) into {} slice(s)",
            inputs.images.len(),
            trimmed.len()
        ),
        json!({
            "slices": sequence.len(),
            "kept": trimmed.len(),
            "per_image_seconds": sequence.slices.first().map(|s| s.duration.as_secs_f64()),
        }),
    );

    log_event(
        Level::Info,
        "normalize",
        format!("Cropping images to {}x{}", frame.width, frame.height),
    );
    let used_images: Vec<PathBuf> = trimmed.slices.iter().map(|s| s.image.clone()).collect();
    let normalized = normalize_all(&used_images, frame, |_| scratch.artifact("frame", "png"))?;
    let frames = map_to_frames(&trimmed, &normalized)?;

    let cues = equalize_cues(&inputs.cues, settings.subtitles_max_chars)?;
    log_event(
        Level::Info,
        "subtitles",
        format!(
            "Prepared {} subtitle cue(s) of at most {} characters",
            cues.len(),
            settings.subtitles_max_chars
        ),
    );
    let captions = write_captions(&cues, &scratch)?;

    log_event(Level::Info, "mix", "Mixing narration with background music");
    let mix_path = scratch.artifact("mix", "wav");
    services.audio.mix(
        &inputs.narration,
        inputs.music.as_deref(),
        settings.music_volume as f32,
        &mix_path,
    )?;

    let pipeline = RenderPipeline::new(RenderPipelineParams {
        output: output_path.clone(),
        slices: frames,
        captions,
        audio: mix_path,
        duration,
        frame,
        style: SubtitleStyle::from_settings(settings, inputs.font),
        threads: settings.threads,
        verbose: settings.verbose,
        runner: services.runner,
    });

    if request.dry_run {
        pipeline.print_command()?;
        let kept = scratch.keep();
        log_event(
            Level::Info,
            "dry_run",
            format!(
                "Dry run completed; intermediate files kept in {}",
                kept.display()
            ),
        );
        return Ok(None);
    }

    log_event(Level::Info, "compose", "Starting ffmpeg render");
    let guard = OutputGuard::new(output_path);
    pipeline.execute()?;

    if !output_path_written(&guard) {
        return Err(RenderError::failure("ffmpeg finished without writing the output file").into());
    }
    let output_path = guard.commit();

    log_event(
        Level::Success,
        "success",
        format!("Rendered video to {}", output_path.display()),
    );

    Ok(Some(output_path))
}

fn output_path_written(guard: &OutputGuard) -> bool {
    guard
        .path()
        .metadata()
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

fn map_to_frames(
    sequence: &ImageSequence,
    normalized: &[(PathBuf, PathBuf)],
) -> Result<ImageSequence, RenderError> {
    let slices = sequence
        .slices
        .iter()
        .map(|slice| {
            normalized
                .iter()
                .find(|(source, _)| *source == slice.image)
                .map(|(_, frame)| ImageSlice {
                    image: frame.clone(),
                    duration: slice.duration,
                })
                .ok_or_else(|| {
                    RenderError::failure(format!(
                        "no normalized frame for {}",
                        slice.image.display()
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ImageSequence { slices })
}

/// Write each cue's text to its own file so drawtext needs no escaping
fn write_captions(cues: &[SubtitleCue], scratch: &Scratch) -> Result<Vec<Caption>> {
    let mut captions = Vec::new();
    for cue in cues {
        let text = cue.text.trim();
        if text.is_empty() || cue.end <= cue.start {
            continue;
        }
        let text_file = scratch.artifact("caption", "txt");
        fs::write(&text_file, text)
            .with_context(|| format!("Failed to write caption file {}", text_file.display()))?;
        captions.push(Caption {
            start: cue.start,
            end: cue.end,
            text_file,
        });
    }
    Ok(captions)
}

/// Tile `images` over `duration` without touching the files
pub fn plan_slices(images: &[PathBuf], duration: Duration) -> Result<ImageSequence> {
    Ok(tile_images(images, duration)?)
}

#[cfg(test)]
mod tests;
