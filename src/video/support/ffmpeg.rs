use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::video::error::RenderError;

/// Encoder settings appended after the filter graph
#[derive(Debug, Clone, Copy)]
pub struct EncodeProfile {
    pub video_codec: &'static str,
    pub pixel_format: &'static str,
    pub preset: &'static str,
    pub crf: u8,
    pub audio_codec: &'static str,
    pub audio_bitrate: &'static str,
    pub faststart: bool,
}

pub const PROFILE_H264_AAC_FASTSTART: EncodeProfile = EncodeProfile {
    video_codec: "libx264",
    pixel_format: "yuv420p",
    preset: "medium",
    crf: 20,
    audio_codec: "aac",
    audio_bitrate: "192k",
    faststart: true,
};

impl EncodeProfile {
    pub fn push_to(&self, args: &mut Vec<String>) {
        let crf = self.crf.to_string();
        args.extend(
            [
                "-c:v",
                self.video_codec,
                "-preset",
                self.preset,
                "-crf",
                crf.as_str(),
                "-pix_fmt",
                self.pixel_format,
                "-c:a",
                self.audio_codec,
                "-b:a",
                self.audio_bitrate,
            ]
            .map(String::from),
        );
        if self.faststart {
            args.push("-movflags".to_string());
            args.push("+faststart".to_string());
        }
    }
}

/// Fail early with a readable message when a media tool is not installed
pub fn require_tool(name: &str) -> Result<()> {
    which::which(name)
        .map(|_| ())
        .map_err(|_| RenderError::failure(format!("{name} is not installed or not on PATH")).into())
}

pub fn probe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .with_context(|| format!("Failed to run ffprobe for {}", path.display()))?;

    if !output.status.success() {
        return Err(RenderError::failure(format!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        ))
        .into());
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    let duration: f64 = duration_str
        .trim()
        .parse()
        .context("Failed to parse ffprobe duration as f64")?;

    Ok(duration)
}

pub fn probe_duration(path: &Path) -> Result<Duration> {
    let seconds = probe_duration_seconds(path)?;
    Duration::try_from_secs_f64(seconds).map_err(|_| {
        RenderError::failure(format!(
            "ffprobe reported an unusable duration {seconds} for {}",
            path.display()
        ))
        .into()
    })
}

/// Decode any audio file ffmpeg understands into interleaved f32 samples
pub fn decode_pcm_f32(path: &Path, sample_rate: u32, channels: u16) -> Result<Vec<f32>> {
    let output = Command::new("ffmpeg")
        .args(["-v", "error", "-nostdin", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ar",
            &sample_rate.to_string(),
            "-ac",
            &channels.to_string(),
            "pipe:1",
        ])
        .output()
        .with_context(|| format!("Failed to run ffmpeg to decode {}", path.display()))?;

    if !output.status.success() {
        return Err(RenderError::failure(format!(
            "ffmpeg failed to decode {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        ))
        .into());
    }

    Ok(output
        .stdout
        .chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_emits_h264_aac_faststart() {
        let mut args = Vec::new();
        PROFILE_H264_AAC_FASTSTART.push_to(&mut args);
        let joined = args.join(" ");
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-pix_fmt yuv420p"));
        assert!(joined.contains("-c:a aac"));
        assert!(joined.ends_with("-movflags +faststart"));
    }

    #[test]
    fn missing_tool_is_render_failure() {
        let err = require_tool("definitely-not-a-real-tool-name").unwrap_err();
        assert!(crate::video::error::render_error(&err).is_some());
    }
}
