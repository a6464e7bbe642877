use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::video::support::utils::unique_name;

/// Output location of a render: the caller's path (made absolute against
/// `base_dir`) or a fresh name inside `renders_dir`
pub fn resolve_output_path(
    out_file: Option<&Path>,
    base_dir: &Path,
    renders_dir: impl FnOnce() -> Result<PathBuf>,
) -> Result<PathBuf> {
    if let Some(provided) = out_file {
        let resolved = if provided.is_absolute() {
            provided.to_path_buf()
        } else {
            base_dir.join(provided)
        };
        return Ok(resolved);
    }

    Ok(renders_dir()?.join(unique_name("reel", "mp4")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_output_is_anchored() {
        let out = resolve_output_path(Some(Path::new("out.mp4")), Path::new("/work"), || {
            unreachable!("renders dir is not needed")
        })
        .unwrap();
        assert_eq!(out, PathBuf::from("/work/out.mp4"));
    }

    #[test]
    fn default_output_lands_in_renders_dir() {
        let out = resolve_output_path(None, Path::new("/work"), || Ok(PathBuf::from("/renders")))
            .unwrap();
        assert!(out.starts_with("/renders"));
        assert_eq!(out.extension().unwrap(), "mp4");
    }
}
