//! # Raymarch runtime
//!
//! Entry point for the `raymarch_runtime` binary. Plays a scene file
//! headlessly for a fixed number of frames.

use anyhow::Result;
use clap::Parser;
use runtime::RunOptions;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "raymarch_runtime", about = "Plays a camera path and noise volume scene headlessly")]
struct Cli {
    /// Scene file (JSON).
    #[arg(long, default_value = "scenes/blackhole.json")]
    scene: PathBuf,

    /// Number of frames to run.
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Seconds per frame.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Frame on which to fire the trigger. Repeat for several triggers.
    #[arg(long = "trigger-frame")]
    trigger_frames: Vec<u64>,

    /// Reload the scene when the file changes.
    #[arg(long)]
    watch: bool,

    /// Prefer the GPU device when available.
    #[arg(long)]
    gpu: bool,
}

/// Which compute device the run asks for.
enum ExecutionMode {
    Gpu,
    Cpu,
}

impl ExecutionMode {
    fn prefers_gpu(&self) -> bool {
        matches!(self, ExecutionMode::Gpu)
    }
}

fn determine_execution_mode(requested_gpu: bool) -> ExecutionMode {
    if requested_gpu && cfg!(feature = "gpu") {
        ExecutionMode::Gpu
    } else {
        if requested_gpu {
            tracing::warn!("built without the `gpu` feature, using the CPU device");
        }
        ExecutionMode::Cpu
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mode = determine_execution_mode(cli.gpu);
    let options = RunOptions {
        scene: cli.scene,
        frames: cli.frames,
        dt: cli.dt,
        trigger_frames: if cli.trigger_frames.is_empty() {
            vec![0]
        } else {
            cli.trigger_frames
        },
        watch: cli.watch,
        prefer_gpu: mode.prefers_gpu(),
    };

    let summary = runtime::run(&options)?;
    tracing::info!(
        "Finished {} frames, {} poses, {} volume builds. Final pose: {:?}",
        summary.frames,
        summary.poses,
        summary.volume_builds,
        summary.last_pose
    );
    Ok(())
}
