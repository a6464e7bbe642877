use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated HOME and XDG directories for one test run
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        for dir in ["home", "config", "data", "cache", "work"] {
            fs::create_dir_all(temp_dir.path().join(dir))?;
        }
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn home(&self) -> PathBuf {
        self.path().join("home")
    }

    pub fn config_home(&self) -> PathBuf {
        self.path().join("config")
    }

    pub fn data_home(&self) -> PathBuf {
        self.path().join("data")
    }

    pub fn cache_home(&self) -> PathBuf {
        self.path().join("cache")
    }

    /// Directory the binary runs in; relative arguments resolve here
    pub fn work_dir(&self) -> PathBuf {
        self.path().join("work")
    }

    /// Settings file passed with `--config`
    pub fn config_file(&self) -> PathBuf {
        self.config_home().join("reelforge").join("render.toml")
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.cache_home().join("reelforge").join("scratch")
    }

    pub fn write_file(&self, relative: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.work_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }
}
