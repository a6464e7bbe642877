use anyhow::Result;

use super::FfmpegCompiler;
use super::FilterChain;
use super::inputs::SourceMap;
use super::util::format_time;
use crate::video::render::timeline::ImageSequence;

impl FfmpegCompiler {
    /// Trim every still to its slice length and concatenate them in order.
    /// Returns the label of the concatenated stream.
    pub(super) fn build_slice_filters(
        &self,
        filters: &mut FilterChain,
        slices: &ImageSequence,
        source_map: &SourceMap,
    ) -> Result<String> {
        let mut concat_inputs = String::new();

        for (idx, slice) in slices.slices.iter().enumerate() {
            let input_index = source_map.slice_index(idx)?;
            let label = format!("v{idx}");
            filters.push(format!(
                "[{input}:v]trim=duration={duration},setpts=PTS-STARTPTS,fps={fps},scale={width}:{height},setsar=1,format=yuv420p[{label}]",
                input = input_index,
                duration = format_time(slice.duration),
                fps = self.frame.fps,
                width = self.frame.width,
                height = self.frame.height,
                label = label,
            ));
            concat_inputs.push_str(&format!("[{label}]"));
        }

        let output = "concat_v".to_string();
        filters.push(format!(
            "{inputs}concat=n={count}:v=1:a=0[{output}]",
            inputs = concat_inputs,
            count = slices.len(),
            output = output,
        ));

        Ok(output)
    }
}
