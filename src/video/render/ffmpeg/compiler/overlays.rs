use std::time::Duration;

use super::util::{escape_ffmpeg_path, escape_filter_value, format_time};
use super::{Caption, FfmpegCompiler, FilterChain};

impl FfmpegCompiler {
    /// Chain one centered `drawtext` per caption onto `input_label`.
    /// Each caption shows on `start <= t < end`, so adjacent cues never overlap.
    /// Returns the label carrying the subtitled video.
    pub(super) fn apply_captions(
        &self,
        filters: &mut FilterChain,
        captions: &[Caption],
        total_duration: Duration,
        input_label: &str,
    ) -> String {
        let mut current = input_label.to_string();

        let visible = captions
            .iter()
            .filter(|caption| caption.end > caption.start && caption.start < total_duration);

        for (idx, caption) in visible.enumerate() {
            let next = format!("sub{idx}");
            filters.push(format!(
                "[{input}]{drawtext}[{output}]",
                input = current,
                drawtext = self.build_drawtext(caption),
                output = next,
            ));
            current = next;
        }

        current
    }

    fn build_drawtext(&self, caption: &Caption) -> String {
        let style = &self.style;
        format!(
            "drawtext=fontfile='{font}':textfile='{text}':expansion=none:fontsize={size}:fontcolor='{color}':bordercolor='{border}':borderw={border_width}:x=(w-text_w)/2:y=(h-text_h)/2:enable='gte(t,{start})*lt(t,{end})'",
            font = escape_ffmpeg_path(&style.font_file),
            text = escape_ffmpeg_path(&caption.text_file),
            size = style.font_size,
            color = escape_filter_value(&style.font_color),
            border = escape_filter_value(&style.outline_color),
            border_width = style.outline_thickness,
            start = format_time(caption.start),
            end = format_time(caption.end),
        )
    }
}
