use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use image::RgbImage;
use tempfile::{TempDir, tempdir};

use super::*;
use crate::video::error::render_error;

struct StubAudio {
    duration: Duration,
    mixed_with: RefCell<Option<Option<PathBuf>>>,
}

impl StubAudio {
    fn new(seconds: f64) -> Self {
        Self {
            duration: Duration::from_secs_f64(seconds),
            mixed_with: RefCell::new(None),
        }
    }
}

impl AudioServices for StubAudio {
    fn probe_duration(&self, _path: &Path) -> Result<Duration> {
        Ok(self.duration)
    }

    fn mix(
        &self,
        _narration: &Path,
        background: Option<&Path>,
        _volume: f32,
        output: &Path,
    ) -> Result<Duration> {
        fs::write(output, b"RIFF")?;
        *self.mixed_with.borrow_mut() = Some(background.map(Path::to_path_buf));
        Ok(self.duration)
    }
}

#[derive(Default)]
struct StubRunner {
    fail: bool,
    calls: Cell<usize>,
    args: RefCell<Vec<String>>,
}

impl FfmpegRunner for StubRunner {
    fn run(&self, args: &[String], _options: FfmpegRunOptions) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        *self.args.borrow_mut() = args.to_vec();
        let output = args.last().expect("output path is the last argument");
        fs::write(output, b"partial video")?;
        if self.fail {
            bail!(RenderError::failure("ffmpeg exited with status 1"));
        }
        Ok(())
    }
}

struct Fixture {
    dir: TempDir,
    settings: RenderSettings,
    locations: RenderLocations,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let root = dir.path();

        for (name, (w, h)) in [("a.png", (64, 36)), ("b.png", (30, 60))] {
            RgbImage::new(w, h).save(root.join(name)).unwrap();
        }
        fs::write(root.join("voice.mp3"), b"narration").unwrap();
        fs::write(root.join("font.ttf"), b"font").unwrap();
        fs::write(
            root.join("subs.srt"),
            "1\n00:00:00,000 --> 00:00:02,000\nthe quick brown fox\n\n\
             2\n00:00:02,000 --> 00:00:03,000\njumps\n\n",
        )
        .unwrap();

        let settings = RenderSettings {
            font: root.join("font.ttf").display().to_string(),
            ..RenderSettings::default()
        };
        let locations = RenderLocations {
            scratch_root: root.join("scratch"),
            renders_dir: root.join("renders"),
            base_dir: root.to_path_buf(),
        };

        Self {
            dir,
            settings,
            locations,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn request(&self) -> RenderRequest {
        RenderRequest {
            images: vec![
                self.path("a.png").display().to_string(),
                self.path("b.png").display().to_string(),
            ],
            narration: self.path("voice.mp3"),
            subtitles: self.path("subs.srt"),
            output: Some(PathBuf::from("out/reel.mp4")),
            music: MusicSource::None,
            force: false,
            dry_run: false,
        }
    }

    fn render(
        &self,
        request: RenderRequest,
        runner: &StubRunner,
        audio: &StubAudio,
    ) -> Result<Option<PathBuf>> {
        let services = RenderServices { runner, audio };
        render_with_services(request, &self.settings, &self.locations, &services)
    }

    fn scratch_entries(&self) -> Vec<PathBuf> {
        match fs::read_dir(&self.locations.scratch_root) {
            Ok(entries) => entries
                .map(|entry| entry.unwrap().path())
                .filter(|path| {
                    path.file_name()
                        .is_some_and(|name| name.to_string_lossy().starts_with("render_"))
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[test]
fn successful_render_commits_output_and_cleans_scratch() {
    let fixture = Fixture::new();
    let runner = StubRunner::default();
    let audio = StubAudio::new(3.0);

    let output = fixture
        .render(fixture.request(), &runner, &audio)
        .unwrap()
        .unwrap();

    assert_eq!(output, fixture.path("out/reel.mp4"));
    assert!(output.is_file());
    assert_eq!(runner.calls.get(), 1);
    assert!(fixture.scratch_entries().is_empty());
}

#[test]
fn composition_uses_one_input_per_slice_plus_audio() {
    let fixture = Fixture::new();
    let runner = StubRunner::default();
    let audio = StubAudio::new(3.0);

    fixture.render(fixture.request(), &runner, &audio).unwrap();

    let args = runner.args.borrow();
    let inputs = args.iter().filter(|arg| *arg == "-i").count();
    assert_eq!(inputs, 3);

    let filter = args
        .iter()
        .skip_while(|arg| *arg != "-filter_complex")
        .nth(1)
        .unwrap();
    assert!(filter.contains("concat=n=2"));
    // "the quick brown fox" splits into two captions, plus "jumps"
    assert_eq!(filter.matches("drawtext=").count(), 3);
}

#[test]
fn failed_compose_leaves_no_output() {
    let fixture = Fixture::new();
    let runner = StubRunner {
        fail: true,
        ..StubRunner::default()
    };
    let audio = StubAudio::new(3.0);

    let err = fixture
        .render(fixture.request(), &runner, &audio)
        .unwrap_err();

    assert!(matches!(
        render_error(&err),
        Some(RenderError::RenderFailure(_))
    ));
    assert!(!fixture.path("out/reel.mp4").exists());
    assert!(fixture.scratch_entries().is_empty());
}

#[test]
fn missing_narration_is_rejected_before_any_work() {
    let fixture = Fixture::new();
    let runner = StubRunner::default();
    let audio = StubAudio::new(3.0);
    let request = RenderRequest {
        narration: fixture.path("nope.mp3"),
        ..fixture.request()
    };

    let err = fixture.render(request, &runner, &audio).unwrap_err();

    assert!(render_error(&err).is_some_and(RenderError::is_invalid_input));
    assert_eq!(runner.calls.get(), 0);
    assert!(audio.mixed_with.borrow().is_none());
    assert!(!fixture.path("out").exists());
}

#[test]
fn missing_font_is_invalid_input() {
    let mut fixture = Fixture::new();
    fixture.settings.font = fixture.path("missing.ttf").display().to_string();
    let runner = StubRunner::default();
    let audio = StubAudio::new(3.0);

    let err = fixture
        .render(fixture.request(), &runner, &audio)
        .unwrap_err();

    assert!(render_error(&err).is_some_and(RenderError::is_invalid_input));
    assert_eq!(runner.calls.get(), 0);
}

#[test]
fn existing_output_requires_force() {
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.path("out")).unwrap();
    fs::write(fixture.path("out/reel.mp4"), b"old").unwrap();
    let runner = StubRunner::default();
    let audio = StubAudio::new(3.0);

    let err = fixture
        .render(fixture.request(), &runner, &audio)
        .unwrap_err();
    assert!(render_error(&err).is_some_and(RenderError::is_invalid_input));
    assert_eq!(fs::read(fixture.path("out/reel.mp4")).unwrap(), b"old");

    let request = RenderRequest {
        force: true,
        ..fixture.request()
    };
    fixture.render(request, &runner, &audio).unwrap();
    assert_eq!(
        fs::read(fixture.path("out/reel.mp4")).unwrap(),
        b"partial video"
    );
}

#[test]
fn dry_run_keeps_scratch_and_skips_ffmpeg() {
    let fixture = Fixture::new();
    let runner = StubRunner::default();
    let audio = StubAudio::new(3.0);
    let request = RenderRequest {
        dry_run: true,
        ..fixture.request()
    };

    let result = fixture.render(request, &runner, &audio).unwrap();

    assert!(result.is_none());
    assert_eq!(runner.calls.get(), 0);
    assert!(!fixture.path("out/reel.mp4").exists());

    let kept = fixture.scratch_entries();
    assert_eq!(kept.len(), 1);
    let frames = fs::read_dir(&kept[0])
        .unwrap()
        .filter(|entry| {
            entry
                .as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .starts_with("frame_")
        })
        .count();
    assert_eq!(frames, 2);
}

#[test]
fn explicit_music_reaches_the_mixer() {
    let fixture = Fixture::new();
    let song = fixture.path("song.mp3");
    fs::write(&song, b"music").unwrap();
    let runner = StubRunner::default();
    let audio = StubAudio::new(3.0);
    let request = RenderRequest {
        music: MusicSource::File(song.clone()),
        ..fixture.request()
    };

    fixture.render(request, &runner, &audio).unwrap();

    let mixed = audio.mixed_with.borrow().clone().unwrap();
    assert_eq!(mixed, Some(song.canonicalize().unwrap()));
}

#[test]
fn empty_songs_dir_is_invalid_input() {
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.path("songs")).unwrap();
    let runner = StubRunner::default();
    let audio = StubAudio::new(3.0);
    let request = RenderRequest {
        music: MusicSource::RandomFrom(fixture.path("songs")),
        ..fixture.request()
    };

    let err = fixture.render(request, &runner, &audio).unwrap_err();
    assert!(render_error(&err).is_some_and(RenderError::is_invalid_input));
}

#[test]
fn plan_slices_cover_the_duration() {
    let images = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
    let plan = plan_slices(&images, Duration::from_secs(4)).unwrap();
    assert_eq!(plan.len(), 2);
    assert_eq!(plan.total_duration(), Duration::from_secs(4));
}

#[test]
fn malformed_subtitles_are_rejected_before_frames_are_written() {
    let fixture = Fixture::new();
    fs::write(fixture.path("subs.srt"), "1\nnot a timestamp\nhello\n").unwrap();
    let runner = StubRunner::default();
    let audio = StubAudio::new(3.0);

    let err = fixture
        .render(fixture.request(), &runner, &audio)
        .unwrap_err();

    assert!(render_error(&err).is_some_and(RenderError::is_invalid_input));
    assert!(fixture.scratch_entries().is_empty());
    assert!(!fixture.locations.scratch_root.exists());
    assert_eq!(runner.calls.get(), 0);
    assert!(audio.mixed_with.borrow().is_none());
}
