mod common;
mod ui;
mod video;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, ValueHint};
use serde_json::json;

use crate::ui::prelude::*;
use crate::video::{VideoCommands, handle_video_command, render_error};

/// Assemble vertical short-form videos from stills, narration and subtitles
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for events
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    /// Settings file to use instead of the default location
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: VideoCommands,
}

fn main() {
    let cli = Cli::parse();

    ui::init(cli.format, std::io::stdout().is_terminal());
    ui::set_debug_mode(cli.debug);

    if let Err(e) = handle_video_command(cli.command, cli.config.as_deref()) {
        let kind = render_error(&e).map_or("error", |err| err.kind());
        emit(
            Level::Error,
            "reelforge.error",
            &format!("Error: {e:#}"),
            Some(json!({ "kind": kind })),
        );
        std::process::exit(1);
    }
}
