//! `lidarmark-cli` – command line entry point.
//!
//! Subcommands:
//!
//! 1. `run` – connect to rosbridge and run the cylinder detector (and the
//!    scan decimator, unless disabled) until **Ctrl-C**.
//! 2. `detect` – one-shot detection on a recorded LaserScan message, with an
//!    optional recorded Odometry message for the pose.
//! 3. `decimate` – print a recorded scan with only every n-th reading.
//! 4. `overlay` – blend two occupancy-map images into `overlay.png`.

mod config;
mod overlay;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use tracing::{error, info};

use lidarmark_middleware::{EventBus, RosbridgeClient, ros_msgs};
use lidarmark_perception::Pose2D;
use lidarmark_runtime::convert::{laser_scan_from, range_scan_from};
use lidarmark_runtime::{DEFAULT_DECIMATION_STEP, DecimatorNode, DetectorNode, locate_cylinder};
use lidarmark_types::LidarError;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Single-cylinder landmark detection from planar laser scans.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to rosbridge and publish cylinder markers until Ctrl-C.
    Run {
        /// Config file to use instead of ~/.lidarmark/config.toml.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Detect the cylinder in a recorded sensor_msgs/LaserScan JSON message.
    Detect {
        #[arg(long)]
        scan: PathBuf,
        /// Recorded nav_msgs/Odometry JSON message; identity pose if omitted.
        #[arg(long)]
        odom: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Keep every n-th reading of a recorded scan and print the result.
    Decimate {
        #[arg(long)]
        scan: PathBuf,
        #[arg(long, default_value_t = DEFAULT_DECIMATION_STEP)]
        step: usize,
    },
    /// Blend MAP2 into the centre of MAP1.
    Overlay {
        map1: PathBuf,
        map2: PathBuf,
        /// Weight of MAP1 inside the blended region, in [0, 1].
        alpha: f64,
        #[arg(long, default_value = "overlay.png")]
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    // Before the Tokio runtime exists; see `init_tracing`.
    let _guard = lidarmark_runtime::init_tracing("lidarmark");
    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Run { config } => {
            print_banner();
            run(config.as_deref())
        }
        Command::Detect { scan, odom, config } => detect(&scan, odom.as_deref(), config.as_deref()),
        Command::Decimate { scan, step } => decimate(&scan, step),
        Command::Overlay {
            map1,
            map2,
            alpha,
            out,
        } => overlay_maps(&map1, &map2, alpha, &out),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "lidarmark failed");
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subcommands
// ─────────────────────────────────────────────────────────────────────────────

fn run(config_path: Option<&Path>) -> CliResult<()> {
    let cfg = resolve_config(config_path)?;
    println!("  Rosbridge   {}", cfg.rosbridge_url.bold());
    println!(
        "  Topics      {} + {} → {}",
        cfg.scan_topic.cyan(),
        cfg.odom_topic.cyan(),
        cfg.marker_topic.cyan()
    );
    if cfg.decimation_step > 0 {
        println!(
            "  Decimator   every {} → {}",
            cfg.decimation_step,
            cfg.decimated_topic.cyan()
        );
    } else {
        println!("  Decimator   {}", "disabled".dimmed());
    }
    println!();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_pipeline(cfg))
}

async fn run_pipeline(cfg: config::Config) -> CliResult<()> {
    let bus = Arc::new(EventBus::new(cfg.bus_capacity));

    let detector = tokio::spawn(DetectorNode::new(Arc::clone(&bus), cfg.detector()).run());
    let decimator = (cfg.decimation_step > 0).then(|| {
        tokio::spawn(DecimatorNode::new(Arc::clone(&bus), cfg.decimation_step).run())
    });
    let client = RosbridgeClient::new(cfg.rosbridge_url.clone(), Arc::clone(&bus), cfg.ros_topics());

    let outcome: CliResult<()> = tokio::select! {
        result = client.run() => result.map_err(Into::into),
        signal = tokio::signal::ctrl_c() => {
            println!();
            println!("{}", "⚠  Ctrl-C received – shutting down …".yellow().bold());
            signal.map_err(Into::into)
        }
    };

    detector.abort();
    if let Some(decimator) = decimator {
        decimator.abort();
    }
    info!("pipeline stopped");
    outcome
}

fn detect(scan_path: &Path, odom_path: Option<&Path>, config_path: Option<&Path>) -> CliResult<()> {
    let cfg = resolve_config(config_path)?;
    let scan = ros_msgs::laser_scan_from_msg(read_json(scan_path)?)?;
    let pose = match odom_path {
        Some(path) => {
            let odom = ros_msgs::odometry_from_msg(read_json(path)?)?;
            Pose2D::from_position_quaternion(odom.position_x, odom.position_y, odom.orientation)
        }
        None => Pose2D::identity(),
    };

    match locate_cylinder(&cfg.detector(), &range_scan_from(&scan), pose) {
        Some(marker) => println!("{}", to_pretty(&ros_msgs::marker_to_msg(&marker))?),
        None => println!("{}", "no cylinder".yellow()),
    }
    Ok(())
}

fn decimate(scan_path: &Path, step: usize) -> CliResult<()> {
    let scan = ros_msgs::laser_scan_from_msg(read_json(scan_path)?)?;
    let reduced = laser_scan_from(&scan, &range_scan_from(&scan).decimate(step));
    println!("{}", to_pretty(&ros_msgs::laser_scan_to_msg(&reduced))?);
    Ok(())
}

fn overlay_maps(map1: &Path, map2: &Path, alpha: f64, out: &Path) -> CliResult<()> {
    let params = overlay::OverlayParams::with_alpha(alpha);
    let (width, height) = overlay::overlay_files(map1, map2, out, &params)?;
    println!(
        "  {} Overlay {}x{} saved to {}",
        "✓".green().bold(),
        width,
        height,
        out.display().to_string().bold()
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// An explicit path must exist; the default path may be absent.
fn resolve_config(path: Option<&Path>) -> CliResult<config::Config> {
    if let Some(path) = path {
        return match config::load_from(path) {
            Ok(Some(cfg)) => Ok(cfg),
            Ok(None) => Err(LidarError::Config(format!("no config file at {}", path.display())).into()),
            Err(e) => Err(LidarError::Config(e).into()),
        };
    }

    match config::load() {
        Ok(Some(cfg)) => {
            info!(path = %config::config_path().display(), "config loaded");
            Ok(cfg)
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            if let Err(e) = config::save(&cfg) {
                println!("{}: {}", "Could not write default config".yellow(), e);
            }
            Ok(cfg)
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            Ok(cfg)
        }
    }
}

fn read_json(path: &Path) -> CliResult<Value> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| LidarError::Parsing(format!("{}: {e}", path.display())))?;
    let value = serde_json::from_str(&raw)
        .map_err(|e| LidarError::Parsing(format!("{}: {e}", path.display())))?;
    Ok(value)
}

fn to_pretty(value: &Value) -> Result<String, LidarError> {
    serde_json::to_string_pretty(value).map_err(|e| LidarError::Serialization(e.to_string()))
}

fn print_banner() {
    println!();
    println!("{}", r#"   ___    __                         __  "#.bold().cyan());
    println!("{}", r#"  / (_)__/ /__ ___ _  ___ _____ __/ /__"#.bold().cyan());
    println!("{}", r#" / / / _  / _ `/  ' \/ _ `/ __/  '_/ -_)"#.bold().cyan());
    println!("{}", r#"/_/_/\_,_/\_,_/_/_/_/\_,_/_/ /_/\_\\__/ "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "lidarmark".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Cylinder landmark detection for 2D laser scans");
    println!();
}
