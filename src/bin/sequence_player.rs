//! Sequence player - replays a motion sequence file on a headless arm.
//!
//! Accepts the exported `{ base, arm1X, arm1Z, arm2X, arm2Z, duration }` format
//! or plain CSV lines. Each step prints the calibrated angles and the tip
//! position.
//!
//! Usage:
//!   sequence-player <file> [options]
//!
//! Options:
//!   --config <file>      Simulator config JSON
//!   --segments <n>       Number of arm segments (overrides config)
//!   --no-wait            Apply every step immediately instead of in real time
//!   --export <path>      Write the parsed sequence back out in export format

use anyhow::{Context, Result};
use std::time::Duration;
use tobor::{format_sequence, parse_sequence, Simulator, SimulatorConfig, SimulatorHandle};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

struct Args {
    file: Option<String>,
    config_path: Option<String>,
    segments: Option<usize>,
    no_wait: bool,
    export: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut result = Args {
        file: None,
        config_path: None,
        segments: None,
        no_wait: false,
        export: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                result.config_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--segments" if i + 1 < args.len() => {
                result.segments = args[i + 1].parse().ok();
                i += 2;
            }
            "--no-wait" => {
                result.no_wait = true;
                i += 1;
            }
            "--export" if i + 1 < args.len() => {
                result.export = Some(args[i + 1].clone());
                i += 2;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other if !other.starts_with("--") && result.file.is_none() => {
                result.file = Some(other.to_string());
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    result
}

fn print_usage() {
    println!("Sequence Player - replay a recorded arm motion");
    println!();
    println!("Usage: sequence-player <file> [options]");
    println!();
    println!("Options:");
    println!("  --config <file>      Simulator config JSON");
    println!("  --segments <n>       Number of arm segments (overrides config)");
    println!("  --no-wait            Apply every step immediately");
    println!("  --export <path>      Write the parsed sequence in export format");
    println!();
    println!("Examples:");
    println!("  sequence-player robot_motion_2024-02-29T13-05-09-042Z.txt");
    println!("  sequence-player moves.csv --segments 3 --no-wait --export moves.txt");
}

fn print_step(sim: &Simulator, index: usize, total: usize) {
    let tip = sim.chain().tip_world_position();
    let display = serde_json::to_string(sim.display()).unwrap_or_default();
    println!(
        "step {}/{}: {} tip=({:.2}, {:.2}, {:.2})",
        index + 1,
        total,
        display,
        tip.x,
        tip.y,
        tip.z
    );
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

fn play_instant(mut sim: Simulator, text: &str) {
    let total = sim.load_sequence(text);
    if !sim.begin_playback() {
        return;
    }
    while let Some(step) = sim.playback_step() {
        print_step(&sim, step.index, total);
    }
    sim.finish_playback();
}

async fn play_timed(sim: Simulator, text: &str) -> Result<()> {
    let handle = SimulatorHandle::new(sim);
    let Some(mut task) = handle.play_sequence(text) else {
        return Ok(());
    };
    let total = handle.with(|sim| sim.player().frames().len());

    let mut poll = tokio::time::interval(Duration::from_millis(20));
    let mut printed = 0;
    loop {
        tokio::select! {
            result = &mut task => {
                result?;
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, stopping playback...");
                handle.stop_playback();
                task.await?;
                break;
            }
            _ = poll.tick() => {
                handle.with(|sim| {
                    let index = sim.player().index();
                    if sim.player().is_playing() && index > printed {
                        printed = index;
                        print_step(sim, index - 1, total);
                    }
                });
            }
        }
    }

    handle.with(|sim| {
        tracing::info!(
            "Done, IK {}",
            if sim.ik_enabled() { "enabled" } else { "disabled" }
        );
    });
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tobor=info".parse()?)
                .add_directive("sequence_player=info".parse()?),
        )
        .init();

    let args = parse_args();
    let Some(file) = args.file.as_deref() else {
        print_usage();
        std::process::exit(1);
    };

    let mut config = match args.config_path.as_deref() {
        Some(path) => SimulatorConfig::from_json_file(path)?,
        None => SimulatorConfig::default(),
    };
    if let Some(n) = args.segments {
        config.num_segments = n;
    }

    let text = std::fs::read_to_string(file).with_context(|| format!("reading {}", file))?;
    let frames = parse_sequence(&text);
    tracing::info!("{}: {} steps", file, frames.len());

    if let Some(path) = args.export.as_deref() {
        std::fs::write(path, format_sequence(&frames))
            .with_context(|| format!("writing {}", path))?;
        tracing::info!("Exported {} steps to {}", frames.len(), path);
    }

    if frames.is_empty() {
        tracing::warn!("Nothing to play");
        return Ok(());
    }

    let sim = Simulator::new(config);

    if args.no_wait {
        play_instant(sim, &text);
        Ok(())
    } else {
        play_timed(sim, &text).await
    }
}
