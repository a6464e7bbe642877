mod common;
mod utils;

use anyhow::Result;
use common::TestEnvironment;
use std::fs;
use utils::{SAMPLE_SRT, run_reelforge_command};

#[test]
fn test_equalize_rewrites_file_in_place() -> Result<()> {
    let env = TestEnvironment::new()?;
    let srt = env.write_file("subs.srt", SAMPLE_SRT)?;

    let output = run_reelforge_command(&env, &["equalize", "subs.srt", "--max-chars", "10"])?;
    assert_eq!(output.exit_code, 0, "equalize failed: {}", output.stderr);

    let written = fs::read_to_string(&srt)?;
    assert!(written.contains("\nthe quick\n"));
    assert!(written.contains("\nbrown fox\n"));
    assert!(written.contains("3\n00:00:02,000 --> 00:00:03,000\njumps\n"));
    Ok(())
}

#[test]
fn test_equalize_to_separate_output_keeps_input() -> Result<()> {
    let env = TestEnvironment::new()?;
    let srt = env.write_file("subs.srt", SAMPLE_SRT)?;

    let output = run_reelforge_command(
        &env,
        &["equalize", "subs.srt", "--max-chars", "10", "-o", "short.srt"],
    )?;
    assert_eq!(output.exit_code, 0, "equalize failed: {}", output.stderr);

    assert_eq!(fs::read_to_string(&srt)?, SAMPLE_SRT);
    let short = fs::read_to_string(env.work_dir().join("short.srt"))?;
    assert!(short.contains("\nbrown fox\n"));
    Ok(())
}

#[test]
fn test_equalize_rejects_malformed_subtitles() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_file("broken.srt", "1\nnot a timestamp\nhello\n")?;

    let output = run_reelforge_command(&env, &["equalize", "broken.srt"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("Invalid input"), "{}", output.stderr);
    Ok(())
}

#[test]
fn test_render_with_missing_audio_fails_without_output() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_file("a.png", b"not decoded before validation")?;
    env.write_file("subs.srt", SAMPLE_SRT)?;

    let output = run_reelforge_command(
        &env,
        &[
            "render",
            "--images",
            "a.png",
            "--audio",
            "missing.mp3",
            "--subtitles",
            "subs.srt",
            "-o",
            "out.mp4",
        ],
    )?;

    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("Invalid input"), "{}", output.stderr);
    assert!(output.stderr.contains("missing.mp3"), "{}", output.stderr);
    assert!(!env.work_dir().join("out.mp4").exists());
    Ok(())
}

#[test]
fn test_render_with_missing_image_reports_invalid_input() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_file("voice.mp3", b"audio")?;
    env.write_file("subs.srt", SAMPLE_SRT)?;

    let output = run_reelforge_command(
        &env,
        &[
            "--format",
            "json",
            "render",
            "--images",
            "gone.png",
            "--audio",
            "voice.mp3",
            "--subtitles",
            "subs.srt",
        ],
    )?;

    assert_eq!(output.exit_code, 1);
    let error: serde_json::Value = output
        .stderr
        .lines()
        .find_map(|line| serde_json::from_str(line).ok())
        .expect("error event on stderr");
    assert_eq!(error["level"], "error");
    assert_eq!(error["data"]["kind"], "invalid_input");
    Ok(())
}

#[test]
fn test_render_requires_images() -> Result<()> {
    let env = TestEnvironment::new()?;
    let output = run_reelforge_command(
        &env,
        &["render", "--audio", "voice.mp3", "--subtitles", "subs.srt"],
    )?;
    assert_eq!(output.exit_code, 2, "clap usage error expected");
    Ok(())
}

#[test]
fn test_plan_tiles_images_over_duration() -> Result<()> {
    let env = TestEnvironment::new()?;
    let output = run_reelforge_command(
        &env,
        &[
            "--format", "json", "plan", "--images", "a.png", "b.png", "c.png", "--duration",
            "12",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "plan failed: {}", output.stderr);

    let events = output.json_events();
    let slices: Vec<_> = events
        .iter()
        .filter(|event| event["code"] == "plan.slice")
        .collect();
    assert_eq!(slices.len(), 3);
    assert_eq!(slices[0]["data"]["image"], "a.png");
    assert_eq!(slices[2]["data"]["image"], "c.png");
    for slice in &slices {
        assert_eq!(slice["data"]["duration"], 4.0);
    }
    assert_eq!(slices[2]["data"]["start"], 8.0);
    Ok(())
}

#[test]
fn test_plan_rejects_zero_duration() -> Result<()> {
    let env = TestEnvironment::new()?;
    let output = run_reelforge_command(
        &env,
        &["plan", "--images", "a.png", "--duration", "0"],
    )?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("Invalid input"), "{}", output.stderr);
    Ok(())
}

#[test]
fn test_clean_keeps_json_files() -> Result<()> {
    let env = TestEnvironment::new()?;
    let leftover = env.scratch_root().join("render_old");
    fs::create_dir_all(&leftover)?;
    fs::write(leftover.join("frame.png"), b"png")?;
    fs::write(leftover.join("meta.json"), b"{}")?;
    let stale = env.scratch_root().join("render_stale");
    fs::create_dir_all(&stale)?;
    fs::write(stale.join("mix.wav"), b"wav")?;

    let output = run_reelforge_command(&env, &["clean"])?;
    assert_eq!(output.exit_code, 0, "clean failed: {}", output.stderr);

    assert!(!leftover.join("frame.png").exists());
    assert!(leftover.join("meta.json").exists());
    assert!(!stale.exists());
    Ok(())
}

#[test]
fn test_config_init_writes_documented_file() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_reelforge_command(&env, &["config", "--init"])?;
    assert_eq!(output.exit_code, 0, "config --init failed: {}", output.stderr);

    let written = fs::read_to_string(env.config_file())?;
    assert!(written.contains("music_volume = 0.2"));
    assert!(written.contains("subtitles_max_chars = 10"));
    assert!(written.contains("# songs_dir = "));

    let output = run_reelforge_command(&env, &["config"])?;
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("subtitles_font_color = \"#FFFF00\""));
    Ok(())
}

#[test]
fn test_invalid_settings_are_rejected() -> Result<()> {
    let env = TestEnvironment::new()?;
    let config = env.config_file();
    fs::create_dir_all(config.parent().unwrap())?;
    fs::write(&config, "music_volume = 1.5\n")?;
    env.write_file("subs.srt", SAMPLE_SRT)?;

    let output = run_reelforge_command(&env, &["equalize", "subs.srt"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("music_volume"), "{}", output.stderr);
    Ok(())
}
