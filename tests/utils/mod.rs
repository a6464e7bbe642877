use anyhow::Result;
use std::process::Command;

use super::common::TestEnvironment;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Parse every stdout line that holds a JSON event
    pub fn json_events(&self) -> Vec<serde_json::Value> {
        self.stdout
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

pub fn run_reelforge_command(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let config = env.config_file();
    let output = Command::new(env!("CARGO_BIN_EXE_reelforge"))
        .args(args)
        .arg("--config")
        .arg(&config)
        .current_dir(env.work_dir())
        .env("HOME", env.home())
        .env("XDG_CONFIG_HOME", env.config_home())
        .env("XDG_DATA_HOME", env.data_home())
        .env("XDG_CACHE_HOME", env.cache_home())
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

pub const SAMPLE_SRT: &str = "1\n00:00:00,000 --> 00:00:02,000\nthe quick brown fox\n\n\
2\n00:00:02,000 --> 00:00:03,000\njumps\n\n";
