use crate::ui::prelude::{Level, emit};

/// Emit a render event; `step` is namespaced under `render.`
pub(super) fn log_event(level: Level, step: &str, message: impl Into<String>) {
    let message = message.into();
    emit(level, &format!("render.{step}"), &message, None);
}

pub(super) fn log_event_with_data(
    level: Level,
    step: &str,
    message: impl Into<String>,
    data: serde_json::Value,
) {
    let message = message.into();
    emit(level, &format!("render.{step}"), &message, Some(data));
}
