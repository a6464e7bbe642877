use clap::{Args, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum VideoCommands {
    /// Render a vertical video from images, narration and subtitles
    Render(RenderArgs),
    /// Split long subtitle cues so none exceeds the character limit
    Equalize(EqualizeArgs),
    /// Show how images would be tiled over a narration length
    Plan(PlanArgs),
    /// Remove leftover scratch files from earlier renders
    Clean,
    /// Print the effective settings or write the documented config file
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Images shown in order; local paths or http(s) URLs
    #[arg(short = 'i', long = "images", required = true, num_args = 1.., value_hint = ValueHint::FilePath)]
    pub images: Vec<String>,

    /// Narration audio; its length sets the video length
    #[arg(short = 'a', long = "audio", value_hint = ValueHint::FilePath)]
    pub audio: PathBuf,

    /// Subtitles in SRT format
    #[arg(short = 's', long = "subtitles", value_hint = ValueHint::FilePath)]
    pub subtitles: PathBuf,

    /// Output file; defaults to a new file in the renders directory
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,

    /// Background track; overrides the random pick from `songs_dir`
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "no_music")]
    pub music: Option<PathBuf>,

    /// Narration only, no background music
    #[arg(long)]
    pub no_music: bool,

    /// Overwrite the output file if it exists
    #[arg(long)]
    pub force: bool,

    /// Print the ffmpeg command and keep the scratch files instead of encoding
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EqualizeArgs {
    /// SRT file to equalize
    #[arg(value_hint = ValueHint::FilePath)]
    pub subtitles: PathBuf,

    /// Maximum characters per cue; defaults to `subtitles_max_chars`
    #[arg(short = 'm', long = "max-chars")]
    pub max_chars: Option<usize>,

    /// Where to write the result; defaults to rewriting the input
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Images in display order
    #[arg(short = 'i', long = "images", required = true, num_args = 1..)]
    pub images: Vec<PathBuf>,

    /// Narration length in seconds
    #[arg(short = 'd', long = "duration")]
    pub duration: f64,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Write the documented settings file if it does not exist yet
    #[arg(long)]
    pub init: bool,
}
