//! Narration and background music mixing.
//!
//! Both tracks are decoded to interleaved f32 PCM, the background is scaled
//! by a flat gain and the two are summed. No ducking, fades or
//! normalization, so the same inputs always give the same samples.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::ui::prelude::{Level, emit};
use crate::video::error::RenderError;
use crate::video::support::ffmpeg::decode_pcm_f32;

pub const MIX_SAMPLE_RATE: u32 = 44_100;
pub const MIX_CHANNELS: u16 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    /// Interleaved samples
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
    /// Playback gain applied when mixing
    pub gain: f32,
}

impl AudioTrack {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
            gain: 1.0,
        }
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / usize::from(self.channels)
        }
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    /// Decode `path` at the mixing rate and layout
    pub fn decode(path: &Path) -> Result<Self> {
        let samples = decode_pcm_f32(path, MIX_SAMPLE_RATE, MIX_CHANNELS)?;
        Ok(Self::new(samples, MIX_CHANNELS, MIX_SAMPLE_RATE))
    }
}

pub fn validate_volume(volume: f32) -> Result<(), RenderError> {
    if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
        return Err(RenderError::invalid(format!(
            "music volume must be between 0.0 and 1.0, got {volume}"
        )));
    }
    Ok(())
}

/// Sum narration with the background scaled by `volume`.
///
/// The result is as long as the longer input; the shorter one is treated
/// as silence past its end.
pub fn mix(
    narration: &AudioTrack,
    background: Option<&AudioTrack>,
    volume: f32,
) -> Result<AudioTrack, RenderError> {
    validate_volume(volume)?;

    let Some(background) = background else {
        return Ok(AudioTrack::new(
            narration.samples.iter().map(|s| s * narration.gain).collect(),
            narration.channels,
            narration.sample_rate,
        ));
    };

    if narration.sample_rate != background.sample_rate || narration.channels != background.channels
    {
        return Err(RenderError::failure(format!(
            "cannot mix {} Hz/{} ch narration with {} Hz/{} ch background",
            narration.sample_rate,
            narration.channels,
            background.sample_rate,
            background.channels
        )));
    }

    let len = narration.samples.len().max(background.samples.len());
    let background_gain = background.gain * volume;
    let samples = (0..len)
        .map(|i| {
            let voice = narration.samples.get(i).copied().unwrap_or(0.0) * narration.gain;
            let music = background.samples.get(i).copied().unwrap_or(0.0) * background_gain;
            voice + music
        })
        .collect();

    Ok(AudioTrack::new(
        samples,
        narration.channels,
        narration.sample_rate,
    ))
}

/// Write the track as a 32-bit float WAV
pub fn write_wav(track: &AudioTrack, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: track.channels,
        sample_rate: track.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|err| RenderError::failure(format!("cannot create {}: {err}", path.display())))?;
    for sample in &track.samples {
        writer
            .write_sample(*sample)
            .map_err(|err| RenderError::failure(format!("cannot write {}: {err}", path.display())))?;
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file {}", path.display()))?;
    Ok(())
}

/// Decode, mix and write the render's audio bed; returns the mix duration
pub fn mix_files(
    narration: &Path,
    background: Option<&Path>,
    volume: f32,
    output: &Path,
) -> Result<Duration> {
    validate_volume(volume)?;

    let narration = AudioTrack::decode(narration)?;
    let background = background.map(AudioTrack::decode).transpose()?;

    let mixed = mix(&narration, background.as_ref(), volume)?;
    emit(
        Level::Debug,
        "audio.mix",
        &format!(
            "Mixed {:.3}s of audio, peak {:.3}",
            mixed.duration().as_secs_f64(),
            mixed.peak()
        ),
        None,
    );
    write_wav(&mixed, output)?;
    Ok(mixed.duration())
}
