use std::time::Duration;

use anyhow::Result;

use super::inputs::SourceMap;
use super::util::format_time;
use super::{FfmpegCompiler, FilterChain};

impl FfmpegCompiler {
    /// The mixed bed, cut (or padded with silence) to exactly `total_duration`
    pub(super) fn build_audio_filters(
        &self,
        filters: &mut FilterChain,
        source_map: &SourceMap,
        total_duration: Duration,
    ) -> Result<()> {
        let input_index = source_map.audio_index()?;
        let duration = format_time(total_duration);
        filters.push(format!(
            "[{input}:a]atrim=duration={duration},asetpts=PTS-STARTPTS,apad=whole_dur={duration}[outa]",
            input = input_index,
        ));
        Ok(())
    }
}
