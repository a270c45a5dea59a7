//! Configuration Vault – reads/writes `~/.lidarmark/config.toml`.

use lidarmark_middleware::RosTopics;
use lidarmark_perception::{CylinderDetector, CylinderSpec, Segmenter, cylinder, segmenter};
use lidarmark_runtime::DEFAULT_DECIMATION_STEP;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted configuration stored in `~/.lidarmark/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// WebSocket URL of the rosbridge server.
    #[serde(default = "default_rosbridge_url")]
    pub rosbridge_url: String,

    #[serde(default = "default_scan_topic")]
    pub scan_topic: String,

    #[serde(default = "default_odom_topic")]
    pub odom_topic: String,

    #[serde(default = "default_marker_topic")]
    pub marker_topic: String,

    #[serde(default = "default_decimated_topic")]
    pub decimated_topic: String,

    /// Keep every n-th reading on the decimated topic; `0` disables it.
    #[serde(default = "default_decimation_step")]
    pub decimation_step: usize,

    /// Max distance (m) between neighbouring points of one segment.
    #[serde(default = "default_proximity_threshold")]
    pub proximity_threshold: f64,

    #[serde(default = "default_cylinder_diameter")]
    pub cylinder_diameter: f64,

    #[serde(default = "default_diameter_tolerance")]
    pub diameter_tolerance: f64,

    /// Buffered events per bus topic.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

fn default_rosbridge_url() -> String {
    "ws://localhost:9090".to_string()
}
fn default_scan_topic() -> String {
    RosTopics::default().scan
}
fn default_odom_topic() -> String {
    RosTopics::default().odom
}
fn default_marker_topic() -> String {
    RosTopics::default().marker
}
fn default_decimated_topic() -> String {
    RosTopics::default().decimated
}
fn default_decimation_step() -> usize {
    DEFAULT_DECIMATION_STEP
}
fn default_proximity_threshold() -> f64 {
    segmenter::DEFAULT_PROXIMITY_THRESHOLD
}
fn default_cylinder_diameter() -> f64 {
    cylinder::DEFAULT_DIAMETER
}
fn default_diameter_tolerance() -> f64 {
    cylinder::DEFAULT_TOLERANCE
}
fn default_bus_capacity() -> usize {
    256
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rosbridge_url: default_rosbridge_url(),
            scan_topic: default_scan_topic(),
            odom_topic: default_odom_topic(),
            marker_topic: default_marker_topic(),
            decimated_topic: default_decimated_topic(),
            decimation_step: default_decimation_step(),
            proximity_threshold: default_proximity_threshold(),
            cylinder_diameter: default_cylinder_diameter(),
            diameter_tolerance: default_diameter_tolerance(),
            bus_capacity: default_bus_capacity(),
        }
    }
}

impl Config {
    pub fn detector(&self) -> CylinderDetector {
        CylinderDetector::new(
            Segmenter::new(self.proximity_threshold),
            CylinderSpec::new(self.cylinder_diameter, self.diameter_tolerance),
        )
    }

    pub fn ros_topics(&self) -> RosTopics {
        RosTopics {
            scan: self.scan_topic.clone(),
            odom: self.odom_topic.clone(),
            marker: self.marker_topic.clone(),
            decimated: self.decimated_topic.clone(),
        }
    }
}

/// Return the path to `~/.lidarmark/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".lidarmark").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path, then apply env overrides.
pub fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `LIDARMARK_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `LIDARMARK_ROSBRIDGE_URL` | `rosbridge_url` |
/// | `LIDARMARK_SCAN_TOPIC` | `scan_topic` |
/// | `LIDARMARK_ODOM_TOPIC` | `odom_topic` |
/// | `LIDARMARK_MARKER_TOPIC` | `marker_topic` |
/// | `LIDARMARK_DECIMATION_STEP` | `decimation_step` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("LIDARMARK_ROSBRIDGE_URL") {
        cfg.rosbridge_url = v;
    }
    if let Ok(v) = std::env::var("LIDARMARK_SCAN_TOPIC") {
        cfg.scan_topic = v;
    }
    if let Ok(v) = std::env::var("LIDARMARK_ODOM_TOPIC") {
        cfg.odom_topic = v;
    }
    if let Ok(v) = std::env::var("LIDARMARK_MARKER_TOPIC") {
        cfg.marker_topic = v;
    }
    if let Ok(v) = std::env::var("LIDARMARK_DECIMATION_STEP")
        && let Ok(step) = v.parse::<usize>()
    {
        cfg.decimation_step = step;
    }
}

/// Save the config to disk, creating `~/.lidarmark/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
