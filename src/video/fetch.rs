use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::ui::prelude::{Level, emit};

use super::error::RenderError;
use super::retry::RetryPolicy;
use super::support::utils::{canonicalize_existing, is_url, sha256_hex};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns image references (paths or http(s) URLs) into local files
pub struct ImageResolver {
    downloads_dir: PathBuf,
    policy: RetryPolicy,
}

impl ImageResolver {
    pub fn new(downloads_dir: PathBuf, policy: RetryPolicy) -> Self {
        Self {
            downloads_dir,
            policy,
        }
    }

    /// Resolve every reference in order; the list must not be empty
    pub fn resolve_all(&self, references: &[String]) -> Result<Vec<PathBuf>> {
        if references.is_empty() {
            return Err(RenderError::invalid(
                "no images supplied; at least one image is required to build a video",
            )
            .into());
        }
        references.iter().map(|r| self.resolve(r)).collect()
    }

    pub fn resolve(&self, reference: &str) -> Result<PathBuf> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(RenderError::invalid("image reference must not be empty").into());
        }
        if is_url(reference) {
            return self.download(reference);
        }

        let path = canonicalize_existing(Path::new(reference))?;
        if !path.is_file() {
            return Err(RenderError::invalid(format!("{} is not a file", path.display())).into());
        }
        Ok(path)
    }

    /// Cache location for `url`: the SHA-256 of the URL plus its extension
    pub fn cache_path(&self, url: &str) -> PathBuf {
        let name = match url_extension(url) {
            Some(ext) => format!("{}.{ext}", sha256_hex(url)),
            None => sha256_hex(url),
        };
        self.downloads_dir.join(name)
    }

    fn download(&self, url: &str) -> Result<PathBuf> {
        let destination = self.cache_path(url);
        if destination.exists() {
            emit(
                Level::Debug,
                "fetch.cache_hit",
                &format!("Using cached download for {url}"),
                None,
            );
            return Ok(destination);
        }

        fs::create_dir_all(&self.downloads_dir).with_context(|| {
            format!(
                "Failed to create download cache {}",
                self.downloads_dir.display()
            )
        })?;

        emit(
            Level::Info,
            "fetch.download",
            &format!("Downloading image {url}"),
            None,
        );

        let client = reqwest::blocking::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        let bytes = self.policy.run(&format!("download {url}"), |_| {
            client
                .get(url)
                .send()
                .and_then(|resp| resp.error_for_status())
                .and_then(|resp| resp.bytes())
        })?;

        let partial = destination.with_extension("part");
        fs::write(&partial, &bytes)
            .with_context(|| format!("Failed to write download {}", partial.display()))?;
        fs::rename(&partial, &destination).with_context(|| {
            format!(
                "Failed to move download into place at {}",
                destination.display()
            )
        })?;

        Ok(destination)
    }
}

fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let last = path.rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    let valid = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}
