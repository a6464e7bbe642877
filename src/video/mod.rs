mod audio;
pub mod cli;
pub mod commands;
mod config;
mod error;
mod fetch;
mod music;
mod render;
mod retry;
mod scratch;
mod srt;
mod subtitles;
mod support;

pub use cli::VideoCommands;
pub use commands::handle_video_command;
pub use error::render_error;
