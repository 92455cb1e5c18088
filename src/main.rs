//! Replays detector observations through the head tracking pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use stereo_head_tracking::{
    config::{Config, EXAMPLE_CONFIG},
    filters::FilterKind,
    replay,
    stereo_rig::EyeViewpoint,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Observation log to replay
    #[arg(short, long)]
    input: Option<String>,

    /// Number of ticks of synthetic head motion to generate when no input is given
    #[arg(short, long, default_value = "120")]
    synthetic: usize,

    /// Override the active filter (moving_average, single_exponential, double_exponential, one_euro)
    #[arg(short, long)]
    filter: Option<String>,

    /// Force off-axis projection on
    #[arg(long)]
    off_axis: bool,

    /// Recalibrate at this tick (1-based)
    #[arg(long)]
    recalibrate_at: Option<u64>,

    /// Print the example configuration and exit
    #[arg(long)]
    print_example_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn describe_eye(eye: &EyeViewpoint) -> String {
    eye.frustum.map_or_else(
        || "symmetric".to_string(),
        |f| format!("l={:+.4} r={:+.4} b={:+.4} t={:+.4}", f.left, f.right, f.bottom, f.top),
    )
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    if args.print_example_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Stereo Head Tracking - observation replay");

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        Config::from_file(config_path).with_context(|| format!("loading {config_path}"))?
    } else {
        Config::default()
    };

    if let Some(filter) = &args.filter {
        config.filter.kind = filter.parse::<FilterKind>()?;
    }
    if args.off_axis {
        config.rig.off_axis = true;
    }

    let mut pipeline = config.build_pipeline()?;

    let ticks = if let Some(path) = &args.input {
        info!("Replaying observations from: {}", path);
        replay::load_log(path).with_context(|| format!("reading {path}"))?
    } else {
        info!("Generating {} ticks of synthetic head motion", args.synthetic);
        replay::synthetic_sweep(args.synthetic, 640, 480)
    };

    if ticks.is_empty() {
        warn!("No ticks to replay");
    }

    let mut tracked = 0_usize;
    for frame in &ticks {
        let recalibrate = args.recalibrate_at == Some(pipeline.ticks() + 1);
        let output = pipeline.tick(frame.as_ref(), recalibrate)?;
        if output.rig.tracking {
            tracked += 1;
        }

        let anchor = output.rig.anchor_position;
        println!(
            "{:5} {} anchor=({:+.4}, {:+.4}, {:+.4}) yaw={:+.2} pitch={:+.2} | L {} | R {}",
            output.tick,
            if output.rig.tracking { "T" } else { "-" },
            anchor.x,
            anchor.y,
            anchor.z,
            output.orientation.yaw_deg,
            output.orientation.pitch_deg,
            describe_eye(&output.rig.left),
            describe_eye(&output.rig.right),
        );
    }

    info!("Replayed {} ticks, {} with tracking", ticks.len(), tracked);
    Ok(())
}
