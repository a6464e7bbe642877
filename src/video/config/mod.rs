use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// Import macro from crate root (#[macro_export] places it there)
use crate::common::config::DocumentedConfig;
use crate::common::paths;
use crate::documented_config;

use super::error::RenderError;
use super::retry::RetryPolicy;

/// Style and pipeline settings, loaded once and shared by every stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Font file name (looked up in `fonts_dir`) or absolute path
    pub font: String,
    pub fonts_dir: Option<PathBuf>,
    pub subtitles_max_chars: usize,
    pub subtitles_font_size: u32,
    pub subtitles_font_color: String,
    pub subtitles_outline_color: String,
    pub subtitles_outline_thickness: u32,
    /// Background music volume (0.0-1.0)
    pub music_volume: f64,
    pub songs_dir: Option<PathBuf>,
    pub threads: u32,
    pub retry_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub verbose: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            font: "bold_font.ttf".to_string(),
            fonts_dir: None,
            subtitles_max_chars: 10,
            subtitles_font_size: 100,
            subtitles_font_color: "#FFFF00".to_string(),
            subtitles_outline_color: "black".to_string(),
            subtitles_outline_thickness: 5,
            music_volume: Self::DEFAULT_MUSIC_VOLUME,
            songs_dir: None,
            threads: 2,
            retry_attempts: 3,
            retry_initial_delay_ms: 500,
            verbose: false,
        }
    }
}

documented_config!(RenderSettings {
    fields: [
        font, "Subtitle font file name (resolved against fonts_dir) or absolute path",
        subtitles_max_chars, "Maximum characters per subtitle cue",
        subtitles_font_size, "Subtitle font size in pixels",
        subtitles_font_color, "Subtitle fill color (ffmpeg color name or #RRGGBB)",
        subtitles_outline_color, "Subtitle outline color",
        subtitles_outline_thickness, "Subtitle outline thickness in pixels",
        music_volume, "Background music volume (0.0-1.0)",
        threads, "Encoder worker threads",
        retry_attempts, "Maximum attempts for remote image downloads",
        retry_initial_delay_ms, "First retry delay in milliseconds; doubles on every retry",
        verbose, "Show debug events and raw ffmpeg output",
    ],
    optional: [
        fonts_dir, "Directory holding font files",
        songs_dir, "Directory of candidate background music tracks",
    ],
    config_path: Ok(paths::config_dir()?.join("render.toml")),
});

impl RenderSettings {
    pub const DEFAULT_MUSIC_VOLUME: f64 = 0.2;

    /// Load from the default location, or `path` when given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => <Self as DocumentedConfig>::config_path()?,
        };
        let settings = <Self as DocumentedConfig>::load_from_path_documented(&path)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if !self.music_volume.is_finite() || !(0.0..=1.0).contains(&self.music_volume) {
            return Err(RenderError::invalid(format!(
                "music_volume must be between 0.0 and 1.0, got {}",
                self.music_volume
            )));
        }
        if self.subtitles_max_chars == 0 {
            return Err(RenderError::invalid("subtitles_max_chars must be at least 1"));
        }
        if self.subtitles_font_size == 0 {
            return Err(RenderError::invalid("subtitles_font_size must be at least 1"));
        }
        if self.threads == 0 {
            return Err(RenderError::invalid("threads must be at least 1"));
        }
        if self.font.trim().is_empty() {
            return Err(RenderError::invalid("font must not be empty"));
        }
        Ok(())
    }

    /// Absolute font path; relative names are looked up in `fonts_dir`
    pub fn font_path(&self) -> PathBuf {
        let font = Path::new(&self.font);
        match &self.fonts_dir {
            Some(dir) if font.is_relative() => dir.join(font),
            _ => font.to_path_buf(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_initial_delay_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_written_with_documentation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("render.toml");

        let settings = RenderSettings::load(Some(&path)).unwrap();
        assert_eq!(settings, RenderSettings::default());

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("music_volume = 0.2  # Background music volume (0.0-1.0)"));
        assert!(written.contains("subtitles_font_color = \"#FFFF00\""));
        assert!(written.contains("# songs_dir = "));

        // The documented file parses back to the same settings
        assert_eq!(RenderSettings::load(Some(&path)).unwrap(), settings);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("render.toml");
        fs::write(&path, "subtitles_max_chars = 20\nsongs_dir = \"/music\"\n").unwrap();

        let settings = RenderSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.subtitles_max_chars, 20);
        assert_eq!(settings.songs_dir, Some(PathBuf::from("/music")));
        assert_eq!(settings.threads, 2);
    }

    #[test]
    fn out_of_range_volume_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("render.toml");
        fs::write(&path, "music_volume = 1.5\n").unwrap();

        let err = RenderSettings::load(Some(&path)).unwrap_err();
        assert!(
            crate::video::error::render_error(&err)
                .is_some_and(RenderError::is_invalid_input)
        );
    }

    #[test]
    fn zero_values_are_invalid() {
        let mut settings = RenderSettings {
            threads: 0,
            ..RenderSettings::default()
        };
        assert!(settings.validate().unwrap_err().is_invalid_input());
        settings.threads = 1;
        settings.subtitles_max_chars = 0;
        assert!(settings.validate().unwrap_err().is_invalid_input());
    }

    #[test]
    fn fonts_resolve_against_fonts_dir() {
        let mut settings = RenderSettings {
            fonts_dir: Some(PathBuf::from("/fonts")),
            ..RenderSettings::default()
        };
        assert_eq!(settings.font_path(), PathBuf::from("/fonts/bold_font.ttf"));
        settings.font = "/abs/other.ttf".to_string();
        assert_eq!(settings.font_path(), PathBuf::from("/abs/other.ttf"));
    }
}
