//! Command-line arguments

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

/// TeLeQ offline renderer - runs WAV files through the EQ / Drive / Telefy chain
#[derive(Parser, Debug)]
#[command(name = "teleq-render")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a WAV file and write a 32-bit float WAV
    Render {
        /// Input WAV file (mono or stereo)
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,

        /// Parameter state to load before applying --set
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Parameter assignment, e.g. --set HighMidGain=4.5 (repeatable)
        #[arg(long = "set", value_name = "ID=VALUE")]
        assignments: Vec<String>,

        /// Host block size in frames
        #[arg(short, long, default_value_t = 512)]
        block_size: u32,

        /// Write the final parameter state to this file
        #[arg(long)]
        save_state: Option<PathBuf>,
    },

    /// List every parameter with its range and default
    Params {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Split an `ID=VALUE` assignment
pub fn parse_assignment(text: &str) -> Result<(String, f32)> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| anyhow!("expected ID=VALUE, got '{}'", text))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("missing parameter id in '{}'", text));
    }
    let value: f32 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {}", key))?;
    Ok((key.to_string(), value))
}
