//! TeLeQ Offline Renderer
//!
//! Runs WAV files through the TeLeQ chain and lists the parameter layout.
//! Log verbosity follows `RUST_LOG` (default `teleq=info`).

mod cli;
mod render;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use hound::WavReader;
use teleq_core::{ParamKind, ParameterState, StreamConfig, TeleqProcessor, PARAMETERS};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{parse_assignment, Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("teleq=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            output,
            state,
            assignments,
            block_size,
            save_state,
        } => run_render(
            &input,
            &output,
            state.as_deref(),
            &assignments,
            block_size,
            save_state.as_deref(),
        ),
        Commands::Params { json } => list_parameters(json),
    }
}

fn run_render(
    input: &Path,
    output: &Path,
    state: Option<&Path>,
    assignments: &[String],
    block_size: u32,
    save_state: Option<&Path>,
) -> Result<()> {
    let reader = WavReader::open(input)
        .with_context(|| format!("failed to open {}", input.display()))?;
    let mut audio = render::read_audio(reader)?;
    info!(
        "Loaded {}: {} Hz, {} ch, {} frames",
        input.display(),
        audio.sample_rate,
        audio.channels.len(),
        audio.frames()
    );

    let config = StreamConfig::new(audio.sample_rate, audio.channels.len() as u16, block_size);
    let mut processor = TeleqProcessor::new(config)?;

    if let Some(path) = state {
        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        processor.restore_state(&bytes)?;
    }
    for assignment in assignments {
        let (key, value) = parse_assignment(assignment)?;
        let applied = processor.params().set_by_key(&key, value)?;
        info!("{} = {}", key, applied);
    }

    let peaks = render::render(&mut processor, &mut audio, block_size as usize);
    info!(
        "Peaks in: {:.3} / {:.3}, out: {:.3} / {:.3}",
        peaks.input_left, peaks.input_right, peaks.output_left, peaks.output_right
    );

    let file = File::create(output).with_context(|| format!("failed to create {}", output.display()))?;
    render::write_audio(BufWriter::new(file), &audio)?;
    info!("Wrote {}", output.display());

    if let Some(path) = save_state {
        let json = ParameterState::capture(processor.params()).to_json()?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        info!("Saved parameter state to {}", path.display());
    }

    Ok(())
}

fn list_parameters(json: bool) -> Result<()> {
    if json {
        let layout: Vec<_> = PARAMETERS
            .iter()
            .map(|info| {
                let (min, max) = info.range();
                serde_json::json!({
                    "id": info.key,
                    "name": info.name,
                    "min": min,
                    "max": max,
                    "default": info.default,
                    "choices": match info.kind {
                        ParamKind::Choice(choices) => choices.to_vec(),
                        _ => Vec::new(),
                    },
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    for info in PARAMETERS.iter() {
        let detail = match info.kind {
            ParamKind::Float { min, max, unit } => format!("{} .. {} {}", min, max, unit),
            ParamKind::Bool => "on/off".to_string(),
            ParamKind::Choice(choices) => choices.join(" | "),
        };
        println!(
            "{:<16} {:<18} {:<28} default {}",
            info.key,
            info.name,
            detail.trim_end(),
            info.default
        );
    }
    Ok(())
}
