//! IK sweep - drags the target around a horizontal circle and records the arm.
//!
//! Every step runs one FABRIK solve, records one frame, and logs how far the
//! tip ended up from the target. The recording is written in export format to
//! `<output-dir>/robot_motion_<timestamp>.txt`.
//!
//! Usage:
//!   ik-sweep [options]
//!
//! Options:
//!   --config <file>        Simulator config JSON
//!   --radius <r>           Circle radius (default: 2.0)
//!   --height <h>           Circle height (default: 2.5)
//!   --steps <n>            Steps around the circle (default: 36)
//!   --output-dir <dir>     Output directory (default: .)

use anyhow::{Context, Result};
use glam::DVec3;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};
use tobor::{export_file_name, Simulator, SimulatorConfig};

struct Args {
    config_path: Option<String>,
    radius: f64,
    height: f64,
    steps: usize,
    output_dir: String,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut result = Args {
        config_path: None,
        radius: 2.0,
        height: 2.5,
        steps: 36,
        output_dir: ".".to_string(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                result.config_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--radius" if i + 1 < args.len() => {
                result.radius = args[i + 1].parse().unwrap_or(result.radius);
                i += 2;
            }
            "--height" if i + 1 < args.len() => {
                result.height = args[i + 1].parse().unwrap_or(result.height);
                i += 2;
            }
            "--steps" if i + 1 < args.len() => {
                result.steps = args[i + 1].parse().unwrap_or(result.steps).max(1);
                i += 2;
            }
            "--output-dir" if i + 1 < args.len() => {
                result.output_dir = args[i + 1].clone();
                i += 2;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    result
}

fn print_usage() {
    println!("IK Sweep - drag the target around a circle and record the arm");
    println!();
    println!("Usage: ik-sweep [options]");
    println!();
    println!("Options:");
    println!("  --config <file>        Simulator config JSON");
    println!("  --radius <r>           Circle radius (default: 2.0)");
    println!("  --height <h>           Circle height (default: 2.5)");
    println!("  --steps <n>            Steps around the circle (default: 36)");
    println!("  --output-dir <dir>     Output directory (default: .)");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tobor=info".parse()?)
                .add_directive("ik_sweep=info".parse()?),
        )
        .init();

    let args = parse_args();
    let config = match args.config_path.as_deref() {
        Some(path) => SimulatorConfig::from_json_file(path)?,
        None => SimulatorConfig::default(),
    };
    let mut sim = Simulator::new(config);
    sim.set_ik_enabled(true);

    // Frames are stamped on a synthetic one-second clock so the sweep runs instantly.
    let t0 = Instant::now();
    sim.start_recording(t0);
    sim.begin_drag();
    let mut worst: f64 = 0.0;
    for step in 0..args.steps {
        let angle = std::f64::consts::TAU * step as f64 / args.steps as f64;
        let target = DVec3::new(
            args.radius * angle.sin(),
            args.height,
            args.radius * angle.cos(),
        );
        sim.drag_target(target);
        let error = sim.chain().tip_world_position().distance(target);
        worst = worst.max(error);
        sim.record_tick(t0 + Duration::from_secs(step as u64 + 1));
        tracing::info!(
            "step {:>3}: target=({:.2}, {:.2}, {:.2}) angles={:?} error={:.3}",
            step,
            target.x,
            target.y,
            target.z,
            sim.display().recorded(),
            error
        );
    }
    sim.end_drag();

    let Some(text) = sim.stop_recording() else {
        tracing::warn!("Nothing recorded");
        return Ok(());
    };
    let path = Path::new(&args.output_dir).join(export_file_name(SystemTime::now()));
    std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(
        "Wrote {} steps to {} (worst tip error {:.3})",
        args.steps,
        path.display(),
        worst
    );
    Ok(())
}
