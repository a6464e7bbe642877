use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::video::error::RenderError;

pub(super) fn prepare_output_destination(
    output_path: &Path,
    force: bool,
    inputs: &[&Path],
) -> Result<()> {
    if inputs.iter().any(|input| paths_match(input, output_path)) {
        return Err(RenderError::invalid(format!(
            "Output path {} would overwrite one of the inputs",
            output_path.display()
        ))
        .into());
    }

    if output_path.exists() {
        if force {
            fs::remove_file(output_path).with_context(|| {
                format!(
                    "Failed to remove existing output file {} before overwrite",
                    output_path.display()
                )
            })?;
        } else {
            return Err(RenderError::invalid(format!(
                "Output file {} already exists. Use --force to overwrite.",
                output_path.display()
            ))
            .into());
        }
    }

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    Ok(())
}

fn paths_match(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Deletes a partially written output unless the render commits it
pub(super) struct OutputGuard {
    path: PathBuf,
    committed: bool,
}

impl OutputGuard {
    pub(super) fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    pub(super) fn commit(mut self) -> PathBuf {
        self.committed = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if !self.committed && self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}
