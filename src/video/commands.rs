use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;

use crate::common::config::DocumentedConfig;
use crate::common::paths;
use crate::ui::prelude::*;

use super::cli::{ConfigArgs, EqualizeArgs, PlanArgs, RenderArgs, VideoCommands};
use super::config::RenderSettings;
use super::error::RenderError;
use super::music::MusicSource;
use super::render::{RenderRequest, handle_render, plan_slices};
use super::scratch;
use super::subtitles::equalize_srt_file;

pub fn handle_video_command(command: VideoCommands, config_path: Option<&Path>) -> Result<()> {
    match command {
        VideoCommands::Render(args) => run_render(args, &load_settings(config_path)?),
        VideoCommands::Equalize(args) => run_equalize(args, &load_settings(config_path)?),
        VideoCommands::Plan(args) => run_plan(args),
        VideoCommands::Clean => run_clean(),
        VideoCommands::Config(args) => run_config(args, config_path),
    }
}

pub fn load_settings(config_path: Option<&Path>) -> Result<RenderSettings> {
    let settings = RenderSettings::load(config_path)?;
    if settings.verbose {
        crate::ui::set_debug_mode(true);
    }
    Ok(settings)
}

fn run_render(args: RenderArgs, settings: &RenderSettings) -> Result<()> {
    let music = MusicSource::from_options(
        args.music.as_deref(),
        args.no_music,
        settings.songs_dir.as_deref(),
    );
    let request = RenderRequest {
        images: args.images,
        narration: args.audio,
        subtitles: args.subtitles,
        output: args.out_file,
        music,
        force: args.force,
        dry_run: args.dry_run,
    };

    if let Some(output) = handle_render(request, settings)? {
        emit(
            Level::Info,
            "render.output",
            &output.display().to_string(),
            Some(json!({ "path": output })),
        );
    }
    Ok(())
}

fn run_equalize(args: EqualizeArgs, settings: &RenderSettings) -> Result<()> {
    let max_chars = args.max_chars.unwrap_or(settings.subtitles_max_chars);
    let output = args.out_file.unwrap_or_else(|| args.subtitles.clone());

    let cues = equalize_srt_file(&args.subtitles, &output, max_chars)?;
    emit(
        Level::Success,
        "subtitles.equalized",
        &format!(
            "Wrote {} cue(s) of at most {} characters to {}",
            cues.len(),
            max_chars,
            output.display()
        ),
        Some(json!({
            "cues": cues.len(),
            "max_chars": max_chars,
            "output": output,
        })),
    );
    Ok(())
}

fn run_plan(args: PlanArgs) -> Result<()> {
    let duration = Duration::try_from_secs_f64(args.duration).map_err(|_| {
        RenderError::invalid(format!(
            "duration must be a non-negative number of seconds, got {}",
            args.duration
        ))
    })?;

    let plan = plan_slices(&args.images, duration)?;
    let trimmed = plan.trim_to(duration);
    let starts = trimmed.start_times();

    for (index, (slice, start)) in trimmed.slices.iter().zip(&starts).enumerate() {
        emit(
            Level::Info,
            "plan.slice",
            &format!(
                "{:>3}  {:>9.3}s  {:>8.3}s  {}",
                index + 1,
                start.as_secs_f64(),
                slice.duration.as_secs_f64(),
                slice.image.display()
            ),
            Some(json!({
                "index": index,
                "image": slice.image,
                "start": start.as_secs_f64(),
                "duration": slice.duration.as_secs_f64(),
            })),
        );
    }

    emit(
        Level::Info,
        "plan.summary",
        &format!(
            "{} slice(s) covering {:.3}s ({:.3}s before trimming)",
            trimmed.len(),
            trimmed.total_duration().as_secs_f64(),
            plan.total_duration().as_secs_f64()
        ),
        Some(json!({
            "slices": trimmed.len(),
            "untrimmed_slices": plan.len(),
            "duration": trimmed.total_duration().as_secs_f64(),
        })),
    );
    Ok(())
}

fn run_clean() -> Result<()> {
    let root = paths::scratch_dir()?;
    let report = scratch::clean(&root)
        .with_context(|| format!("Failed to clean scratch directory {}", root.display()))?;
    emit(
        Level::Success,
        "scratch.cleaned",
        &format!(
            "Removed {} file(s) and {} empty folder(s) from {}",
            report.files_removed,
            report.dirs_removed,
            root.display()
        ),
        Some(json!({
            "files_removed": report.files_removed,
            "dirs_removed": report.dirs_removed,
            "root": root,
        })),
    );
    Ok(())
}

fn run_config(args: ConfigArgs, config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => <RenderSettings as DocumentedConfig>::config_path()?,
    };

    if args.init {
        return init_config(&path);
    }

    let settings = load_settings(Some(&path))?;
    match get_output_format() {
        OutputFormat::Json => emit(
            Level::Info,
            "config.show",
            &path.display().to_string(),
            Some(json!({ "path": path, "settings": settings })),
        ),
        OutputFormat::Text => {
            println!("# {}", path.display());
            print!("{}", settings.to_documented_string());
        }
    }
    Ok(())
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        emit(
            Level::Info,
            "config.exists",
            &format!("Config already exists at {}", path.display()),
            Some(json!({ "path": path })),
        );
        return Ok(());
    }

    RenderSettings::default().save_with_documentation(path)?;
    emit(
        Level::Success,
        "config.written",
        &format!("Wrote documented config to {}", path.display()),
        Some(json!({ "path": path })),
    );
    Ok(())
}
