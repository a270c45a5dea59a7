use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Diameter of the landmark cylinder, also used as the marker's x/y scale.
pub const CYLINDER_DIAMETER_M: f64 = 0.30;

/// Height of the displayed cylinder marker.
pub const CYLINDER_MARKER_HEIGHT_M: f64 = 0.50;

/// Frame every emitted marker is expressed in.
pub const MARKER_FRAME_ID: &str = "map";

/// Marker namespace; together with [`CYLINDER_MARKER_ID`] it makes every
/// detection an update of the same displayed object.
pub const CYLINDER_MARKER_NS: &str = "cylinder";

pub const CYLINDER_MARKER_ID: i32 = 0;

/// ROS 2 `builtin_interfaces/Time`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosTime {
    pub sec: i32,
    pub nanosec: u32,
}

impl RosTime {
    /// Wall-clock time now.
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            sec: i32::try_from(now.timestamp()).unwrap_or(i32::MAX),
            nanosec: now.timestamp_subsec_nanos(),
        }
    }
}

/// `std_msgs/Header` of a received scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanHeader {
    pub frame_id: String,
    pub stamp: RosTime,
}

/// One sweep of a planar range sensor, as delivered by the scan stream.
///
/// Besides the readings the scan keeps the message metadata so it can be
/// republished unchanged apart from the readings themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaserScanData {
    pub header: ScanHeader,
    /// Bearing of the first reading (radians, sensor frame).
    pub angle_min: f32,
    /// Bearing of the last reading as reported by the sensor.
    pub angle_max: f32,
    /// Angular step between consecutive readings (radians).
    pub angle_increment: f32,
    /// Seconds between readings.
    pub time_increment: f32,
    /// Seconds between scans.
    pub scan_time: f32,
    pub range_min: f32,
    /// Readings at or beyond this distance are treated as invalid.
    pub range_max: f32,
    /// Measured distances (metres). Non-finite entries are invalid.
    pub ranges: Vec<f32>,
}

/// Robot pose from the odometry stream.
///
/// Only position and orientation are carried; twist is not consumed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdometryData {
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
    /// Orientation quaternion, `(x, y, z, w)` order as on the wire.
    pub orientation: [f64; 4],
}

impl Default for OdometryData {
    fn default() -> Self {
        Self {
            position_x: 0.0,
            position_y: 0.0,
            position_z: 0.0,
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Shape tag carried by a [`CylinderMarker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    Cylinder,
}

/// RGBA colour, each channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Visual record emitted for a detected landmark.
///
/// Everything except the position is fixed, so consumers treat repeated
/// detections as updates to one displayed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CylinderMarker {
    pub frame_id: String,
    /// Detection time.
    pub stamp: RosTime,
    pub namespace: String,
    pub id: i32,
    pub shape: MarkerShape,
    /// World-frame position; `z` is always ground level.
    pub position: [f64; 3],
    /// `(x, y, z)` scale: diameter, diameter, height.
    pub scale: [f64; 3],
    pub color: MarkerColor,
}

impl CylinderMarker {
    /// Build the marker for a landmark at world coordinates `(x, y)`.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            frame_id: MARKER_FRAME_ID.to_string(),
            stamp: RosTime::now(),
            namespace: CYLINDER_MARKER_NS.to_string(),
            id: CYLINDER_MARKER_ID,
            shape: MarkerShape::Cylinder,
            position: [x, y, 0.0],
            scale: [
                CYLINDER_DIAMETER_M,
                CYLINDER_DIAMETER_M,
                CYLINDER_MARKER_HEIGHT_M,
            ],
            color: MarkerColor {
                r: 0.0,
                g: 0.2,
                b: 1.0,
                a: 1.0,
            },
        }
    }
}

/// Unified event wrapper for the internal event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "lidarmark-middleware::ros2/scan"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Wrap `payload` with a fresh id and the current timestamp.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data that can be routed over the internal event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    LaserScan(LaserScanData),
    Odometry(OdometryData),
    CylinderMarker(CylinderMarker),
}

/// Workspace-wide error type.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum LidarError {
    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("Parsing Error: {0}")]
    Parsing(String),

    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}
