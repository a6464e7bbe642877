use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use super::support::utils::unique_name;

pub const DOWNLOADS_DIR: &str = "downloads";

/// Per-render scratch directory, removed on drop unless kept
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create scratch root {}", root.display()))?;
        let dir = tempfile::Builder::new()
            .prefix("render_")
            .tempdir_in(root)
            .with_context(|| format!("Failed to create scratch directory in {}", root.display()))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Fresh, unused path inside the scratch directory
    pub fn artifact(&self, prefix: &str, extension: &str) -> PathBuf {
        loop {
            let candidate = self.dir.path().join(unique_name(prefix, extension));
            if !candidate.exists() {
                return candidate;
            }
        }
    }

    /// Keep the directory on disk (dry runs) and return its path
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanReport {
    pub files_removed: usize,
    pub dirs_removed: usize,
}

/// Remove leftover scratch files below `root`, keeping `.json` files
pub fn clean(root: &Path) -> Result<CleanReport> {
    let mut report = CleanReport::default();
    if root.is_dir() {
        clean_dir(root, &mut report)?;
    }
    Ok(report)
}

fn clean_dir(dir: &Path, report: &mut CleanReport) -> Result<bool> {
    let mut empty = true;
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("Failed to read entry in {}", dir.display()))?
            .path();

        if path.is_dir() {
            if clean_dir(&path, report)? {
                fs::remove_dir(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                report.dirs_removed += 1;
            } else {
                empty = false;
            }
        } else if path.extension().is_some_and(|ext| ext == "json") {
            empty = false;
        } else {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            report.files_removed += 1;
        }
    }
    Ok(empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scratch_is_removed_on_drop() {
        let root = tempdir().unwrap();
        let path = {
            let scratch = Scratch::create(root.path()).unwrap();
            fs::write(scratch.artifact("frame", "png"), b"x").unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn kept_scratch_survives() {
        let root = tempdir().unwrap();
        let scratch = Scratch::create(root.path()).unwrap();
        let kept = scratch.keep();
        assert!(kept.is_dir());
        assert!(kept.starts_with(root.path()));
    }

    #[test]
    fn artifacts_get_distinct_names() {
        let root = tempdir().unwrap();
        let scratch = Scratch::create(root.path()).unwrap();
        let a = scratch.artifact("mix", "wav");
        fs::write(&a, b"").unwrap();
        let b = scratch.artifact("mix", "wav");
        assert_ne!(a, b);
        assert!(b.starts_with(scratch.path()));
    }

    #[test]
    fn clean_keeps_json_files() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("frame.png"), b"").unwrap();
        fs::write(root.path().join("state.json"), b"{}").unwrap();
        let leftover = root.path().join("render_abc");
        fs::create_dir(&leftover).unwrap();
        fs::write(leftover.join("mix.wav"), b"").unwrap();
        let downloads = root.path().join(DOWNLOADS_DIR);
        fs::create_dir(&downloads).unwrap();
        fs::write(downloads.join("meta.json"), b"{}").unwrap();

        let report = clean(root.path()).unwrap();

        assert_eq!(report.files_removed, 2);
        assert_eq!(report.dirs_removed, 1);
        assert!(root.path().join("state.json").exists());
        assert!(downloads.join("meta.json").exists());
        assert!(!leftover.exists());
    }

    #[test]
    fn cleaning_missing_root_is_a_no_op() {
        let root = tempdir().unwrap();
        let report = clean(&root.path().join("nothing")).unwrap();
        assert_eq!(report, CleanReport::default());
    }
}
