// Chaos Fern: CLI entry point.
//
// Runs the chaos game over the configured coefficient preset and writes the
// resulting melody as a MIDI file.
// The pipeline: config → branch draw → chaos-game iteration → SMF encode → write.
//
// Usage:
//   cargo run -p chaos_fern -- [output.mid] [--config FILE] [--iterations N]
//     [--seed N] [--preset NAME] [--tempo BPM]
//
// Presets: fern (default), barnsley. Explicit coefficient sets go in the
// config file. Set RUST_LOG=debug to see NaN recoveries.

use chaos_fern::Result;
use chaos_fern::compose::compose;
use chaos_fern::config::{ComposerConfig, PresetSpec};
use chaos_fern::note::key_frequency_hz;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "generate", about = "Compose a chaos-game melody and write it as MIDI")]
struct Cli {
    /// Output MIDI file (overrides the config's output_path).
    output: Option<PathBuf>,

    /// JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of notes to generate.
    #[arg(long)]
    iterations: Option<usize>,

    /// Seed for the branch draw (random if omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// Built-in coefficient preset.
    #[arg(long)]
    preset: Option<String>,

    /// Tempo in beats per minute.
    #[arg(long)]
    tempo: Option<u16>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ComposerConfig::load(path)?,
        None => ComposerConfig::default(),
    };
    apply_overrides(&mut config, cli);

    println!("=== Chaos Fern ===");
    println!("Output: {}", config.output_path.display());
    println!("Preset: {}", config.preset.label());
    println!("Notes: {}", config.iterations);
    println!(
        "Tempo: {} BPM, {} ticks per quarter",
        config.encoder.tempo_bpm, config.encoder.ticks_per_quarter
    );

    let piece = compose(&config)?;
    println!("Seed: {}", piece.seed);
    if piece.stats.nan_recoveries > 0 {
        println!("NaN recoveries: {}", piece.stats.nan_recoveries);
    }
    if let (Some(low), Some(high)) = (
        piece.notes.iter().map(|n| n.pitch_key).min(),
        piece.notes.iter().map(|n| n.pitch_key).max(),
    ) {
        println!(
            "Key range: {low}..={high} ({} Hz to {} Hz)",
            key_frequency_hz(low),
            key_frequency_hz(high)
        );
    }

    piece.write(&config.output_path)?;
    println!(
        "Done! {} bytes, {:.1}s",
        piece.bytes.len(),
        piece.duration_seconds()
    );
    Ok(())
}

fn apply_overrides(config: &mut ComposerConfig, cli: Cli) {
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if let Some(iterations) = cli.iterations {
        config.iterations = iterations;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(preset) = cli.preset {
        config.preset = PresetSpec::Named(preset);
    }
    if let Some(tempo) = cli.tempo {
        config.encoder.tempo_bpm = tempo;
    }
}
