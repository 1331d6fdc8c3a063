mod camera;
mod keyboard;
mod overlay;

use anyhow::{Context, Result};
use camera::CameraSource;
use chroma_stick::config::StickConfig;
use chroma_stick::control_loop::{ControlLoop, FrameSource, NoOverlay, OverlaySink, UiCommandSource};
use chroma_stick::injector::{KeyInjector, TracingBackend};
use chroma_stick::pipeline::{ControlPipeline, EmissionMode};
use chroma_stick::sources::{AutoCalibrate, ImageSequenceSource};
use clap::Parser;
use keyboard::EnigoBackend;
use overlay::{WindowCommands, WindowOverlay};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stick_runner", version)]
#[command(about = "Steer with a colored marker in front of a webcam; directions become held keys")]
struct Args {
    /// TOML configuration file. Missing fields take their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Capture device index.
    #[arg(long)]
    camera: Option<i32>,

    /// Deadzone radius in pixels.
    #[arg(long)]
    deadzone: Option<u32>,

    /// Replay the images in this directory instead of opening a camera.
    #[arg(long, value_name = "DIR")]
    replay: Option<PathBuf>,

    /// Log key commands instead of sending them to the OS.
    #[arg(long)]
    dry_run: bool,

    /// No window. Calibrates automatically at the first frame with the marker.
    #[arg(long)]
    headless: bool,

    /// Release every key and re-press the active ones each frame.
    #[arg(long)]
    release_all: bool,

    /// Do not flip frames horizontally.
    #[arg(long)]
    no_mirror: bool,

    /// Log filter, e.g. `debug` or `chroma_stick=trace`. Overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let config = load_config(&args)?;
    info!(
        deadzone = config.deadzone,
        emission = ?config.emission,
        mirror = config.mirror,
        "configuration ready"
    );

    let runtime = tokio::runtime::Runtime::new().context("failed to start the tokio runtime")?;
    let bindings = config.keys.clone();
    let started = if args.dry_run {
        runtime.block_on(KeyInjector::spawn(move || Ok(TracingBackend::new(bindings))))
    } else {
        runtime.block_on(KeyInjector::spawn(move || EnigoBackend::new(&bindings)))
    };
    let injector = started.context("failed to start key injection")?;
    let mut keys = injector.handle();

    let mut frames: Box<dyn FrameSource> = match &args.replay {
        Some(dir) => Box::new(ImageSequenceSource::open(dir, config.mirror)?),
        None => Box::new(CameraSource::open(&config)?),
    };
    let (mut commands, mut overlay): (Box<dyn UiCommandSource>, Box<dyn OverlaySink>) = if args.headless {
        (Box::new(AutoCalibrate), Box::new(NoOverlay))
    } else {
        (Box::new(WindowCommands), Box::new(WindowOverlay::new(config.deadzone)?))
    };

    let mut control = ControlLoop::new(ControlPipeline::new(config));
    let outcome = control.run(frames.as_mut(), commands.as_mut(), &mut keys, overlay.as_mut());

    drop(keys);
    let stats = runtime.block_on(injector.shutdown())?;
    info!(delivered = stats.delivered, failed = stats.failed, "key injection finished");
    if !args.headless {
        let _ = opencv::highgui::destroy_all_windows();
    }

    let summary = outcome?;
    info!(frames = summary.frames, stop = ?summary.stop, "stopped");
    Ok(())
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(args: &Args) -> Result<StickConfig> {
    let mut config = match &args.config {
        Some(path) => StickConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => StickConfig::default(),
    };
    if let Some(camera) = args.camera {
        config.camera_index = camera;
    }
    if let Some(deadzone) = args.deadzone {
        config.deadzone = deadzone;
    }
    if args.release_all {
        config.emission = EmissionMode::ReleaseAll;
    }
    if args.no_mirror {
        config.mirror = false;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_defaults() {
        let args = Args::parse_from(["stick_runner", "--deadzone", "25", "--release-all", "--no-mirror"]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.deadzone, 25);
        assert_eq!(config.emission, EmissionMode::ReleaseAll);
        assert!(!config.mirror);
    }

    #[test]
    fn deadzone_flag_beyond_i32_is_rejected() {
        let args = Args::parse_from(["stick_runner", "--deadzone", "4294967295"]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn zero_deadzone_flag_is_rejected() {
        let args = Args::parse_from(["stick_runner", "--deadzone", "0"]);
        assert!(load_config(&args).is_err());
    }
}
