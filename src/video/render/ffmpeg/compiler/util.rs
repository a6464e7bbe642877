use std::path::Path;
use std::time::Duration;

pub fn format_time(value: Duration) -> String {
    format!("{:.6}", value.as_secs_f64())
}

pub fn escape_ffmpeg_path(path: &Path) -> String {
    escape_filter_value(&path.to_string_lossy())
}

/// Escape a value placed inside single quotes in a filter option.
///
/// The filtergraph parser unquotes once and the filter's option parser
/// unquotes again, so an apostrophe leaves the quotes and is escaped for
/// both passes.
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\'', "'\\\\\\''")
        .replace(':', "\\:")
}
