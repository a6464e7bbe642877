use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;
use rand::seq::SliceRandom;

use super::error::RenderError;
use super::support::utils::{canonicalize_existing, extension_or_default};

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a", "aac", "opus"];

/// Where the background track of a render comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicSource {
    /// Narration only
    None,
    /// A specific file
    File(PathBuf),
    /// A random track from a directory
    RandomFrom(PathBuf),
}

impl MusicSource {
    pub fn from_options(
        explicit: Option<&Path>,
        disabled: bool,
        songs_dir: Option<&Path>,
    ) -> Self {
        if disabled {
            return MusicSource::None;
        }
        match (explicit, songs_dir) {
            (Some(file), _) => MusicSource::File(file.to_path_buf()),
            (None, Some(dir)) => MusicSource::RandomFrom(dir.to_path_buf()),
            (None, None) => MusicSource::None,
        }
    }

    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Option<PathBuf>> {
        match self {
            MusicSource::None => Ok(None),
            MusicSource::File(path) => canonicalize_existing(path).map(Some),
            MusicSource::RandomFrom(dir) => choose_random_song(dir, rng).map(Some),
        }
    }
}

/// Audio files directly inside `dir`, sorted by name
pub fn list_songs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(RenderError::invalid(format!(
            "songs directory {} does not exist",
            dir.display()
        ))
        .into());
    }

    let mut songs = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read songs directory {}", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("Failed to read entry in {}", dir.display()))?
            .path();
        let extension = extension_or_default(&path, "");
        if path.is_file() && AUDIO_EXTENSIONS.contains(&extension.as_str()) {
            songs.push(path);
        }
    }
    songs.sort();
    Ok(songs)
}

pub fn choose_random_song<R: Rng + ?Sized>(dir: &Path, rng: &mut R) -> Result<PathBuf> {
    let songs = list_songs(dir)?;
    songs.choose(rng).cloned().ok_or_else(|| {
        RenderError::invalid(format!("no audio files found in {}", dir.display())).into()
    })
}
