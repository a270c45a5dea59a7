//! rosbridge v2 JSON codec.
//!
//! rosbridge carries ROS messages as plain JSON objects wrapped in an
//! operation envelope:
//!
//! ```json
//! {"op": "publish", "topic": "/scan", "msg": { ... }}
//! ```
//!
//! This module covers only the three message types the landmark pipeline
//! touches plus the `subscribe`, `advertise` and `publish` envelopes.
//! Scan headers and timing fields are kept so a scan can be republished;
//! covariances, twists and intensities are ignored on the way in.

use lidarmark_types::{
    CylinderMarker, LaserScanData, LidarError, MarkerShape, OdometryData, ScanHeader,
};
use serde::Deserialize;
use serde_json::{Value, json};

pub const LASER_SCAN_TYPE: &str = "sensor_msgs/msg/LaserScan";
pub const ODOMETRY_TYPE: &str = "nav_msgs/msg/Odometry";
pub const MARKER_TYPE: &str = "visualization_msgs/msg/Marker";

/// `visualization_msgs/Marker::CYLINDER`.
pub const MARKER_TYPE_CYLINDER: i32 = 3;
/// `visualization_msgs/Marker::ADD`.
pub const MARKER_ACTION_ADD: i32 = 0;

/// ROS topic names the pipeline reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosTopics {
    pub scan: String,
    pub odom: String,
    pub marker: String,
    pub decimated: String,
}

impl Default for RosTopics {
    fn default() -> Self {
        Self {
            scan: "/scan".to_string(),
            odom: "/odom".to_string(),
            marker: "/single_cylinder_marker".to_string(),
            decimated: "/scan_remap_nth".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Operation envelopes
// ---------------------------------------------------------------------------

pub fn subscribe_op(topic: &str, msg_type: &str) -> Value {
    json!({ "op": "subscribe", "topic": topic, "type": msg_type })
}

pub fn advertise_op(topic: &str, msg_type: &str) -> Value {
    json!({ "op": "advertise", "topic": topic, "type": msg_type })
}

pub fn publish_op(topic: &str, msg: Value) -> Value {
    json!({ "op": "publish", "topic": topic, "msg": msg })
}

/// An inbound rosbridge frame.  Only `op` is mandatory; status and service
/// frames carry no `topic`/`msg`.
#[derive(Debug, Deserialize)]
pub struct IncomingFrame {
    pub op: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub msg: Option<Value>,
}

impl IncomingFrame {
    /// `Some((topic, msg))` if this is a `publish` frame with both fields.
    pub fn into_publish(self) -> Option<(String, Value)> {
        if self.op != "publish" {
            return None;
        }
        Some((self.topic?, self.msg?))
    }
}

pub fn parse_frame(text: &str) -> Result<IncomingFrame, LidarError> {
    serde_json::from_str(text).map_err(|e| LidarError::Parsing(format!("rosbridge frame: {e}")))
}

// ---------------------------------------------------------------------------
// sensor_msgs/LaserScan
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct WireLaserScan {
    #[serde(default)]
    header: ScanHeader,
    angle_min: f32,
    #[serde(default)]
    angle_max: Option<f32>,
    angle_increment: f32,
    #[serde(default)]
    time_increment: f32,
    #[serde(default)]
    scan_time: f32,
    #[serde(default)]
    range_min: f32,
    range_max: f32,
    /// rosbridge writes NaN and ±inf as `null`.
    #[serde(default)]
    ranges: Vec<Option<f32>>,
}

/// Decode the `msg` body of a LaserScan publish.
pub fn laser_scan_from_msg(msg: Value) -> Result<LaserScanData, LidarError> {
    let wire: WireLaserScan = serde_json::from_value(msg)
        .map_err(|e| LidarError::Parsing(format!("{LASER_SCAN_TYPE}: {e}")))?;
    let ranges: Vec<f32> = wire
        .ranges
        .into_iter()
        .map(|r| r.unwrap_or(f32::NAN))
        .collect();
    // Senders that omit angle_max get the bearing of the last reading.
    let last = ranges.len().saturating_sub(1) as f32;
    let angle_max = wire
        .angle_max
        .unwrap_or(wire.angle_min + wire.angle_increment * last);
    Ok(LaserScanData {
        header: wire.header,
        angle_min: wire.angle_min,
        angle_max,
        angle_increment: wire.angle_increment,
        time_increment: wire.time_increment,
        scan_time: wire.scan_time,
        range_min: wire.range_min,
        range_max: wire.range_max,
        ranges,
    })
}

/// Encode a scan as a LaserScan `msg` body.  Non-finite ranges become `null`.
pub fn laser_scan_to_msg(scan: &LaserScanData) -> Value {
    let ranges: Vec<Value> = scan
        .ranges
        .iter()
        .map(|&r| if r.is_finite() { json!(r) } else { Value::Null })
        .collect();
    json!({
        "header": {
            "frame_id": scan.header.frame_id,
            "stamp": { "sec": scan.header.stamp.sec, "nanosec": scan.header.stamp.nanosec }
        },
        "angle_min": scan.angle_min,
        "angle_max": scan.angle_max,
        "angle_increment": scan.angle_increment,
        "time_increment": scan.time_increment,
        "scan_time": scan.scan_time,
        "range_min": scan.range_min,
        "range_max": scan.range_max,
        "ranges": ranges,
    })
}

// ---------------------------------------------------------------------------
// nav_msgs/Odometry
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct WireOdometry {
    pose: WirePoseWithCovariance,
}

#[derive(Deserialize)]
struct WirePoseWithCovariance {
    pose: WirePose,
}

#[derive(Deserialize)]
struct WirePose {
    position: WirePoint,
    orientation: WireQuaternion,
}

#[derive(Deserialize)]
struct WirePoint {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    z: f64,
}

#[derive(Deserialize)]
struct WireQuaternion {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    z: f64,
    #[serde(default = "default_w")]
    w: f64,
}

fn default_w() -> f64 {
    1.0
}

/// Decode the `msg` body of an Odometry publish.  Only `pose.pose` is read.
pub fn odometry_from_msg(msg: Value) -> Result<OdometryData, LidarError> {
    let wire: WireOdometry = serde_json::from_value(msg)
        .map_err(|e| LidarError::Parsing(format!("{ODOMETRY_TYPE}: {e}")))?;
    let WirePose {
        position,
        orientation,
    } = wire.pose.pose;
    Ok(OdometryData {
        position_x: position.x,
        position_y: position.y,
        position_z: position.z,
        orientation: [orientation.x, orientation.y, orientation.z, orientation.w],
    })
}

// ---------------------------------------------------------------------------
// visualization_msgs/Marker
// ---------------------------------------------------------------------------

fn shape_code(shape: MarkerShape) -> i32 {
    match shape {
        MarkerShape::Cylinder => MARKER_TYPE_CYLINDER,
    }
}

/// Encode a marker as a `visualization_msgs/Marker` `msg` body.
pub fn marker_to_msg(marker: &CylinderMarker) -> Value {
    let [px, py, pz] = marker.position;
    let [sx, sy, sz] = marker.scale;
    json!({
        "header": {
            "frame_id": marker.frame_id,
            "stamp": { "sec": marker.stamp.sec, "nanosec": marker.stamp.nanosec }
        },
        "ns": marker.namespace,
        "id": marker.id,
        "type": shape_code(marker.shape),
        "action": MARKER_ACTION_ADD,
        "pose": {
            "position": { "x": px, "y": py, "z": pz },
            "orientation": { "x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0 }
        },
        "scale": { "x": sx, "y": sy, "z": sz },
        "color": {
            "r": marker.color.r,
            "g": marker.color.g,
            "b": marker.color.b,
            "a": marker.color.a
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(value: &Value, expected: f64) -> bool {
        value.as_f64().is_some_and(|v| (v - expected).abs() < 1e-6)
    }

    #[test]
    fn laser_scan_null_ranges_become_nan() {
        let msg = json!({
            "header": { "frame_id": "laser" },
            "angle_min": -1.5,
            "angle_max": 1.5,
            "angle_increment": 0.5,
            "range_min": 0.1,
            "range_max": 12.0,
            "ranges": [1.0, null, 2.5],
            "intensities": []
        });
        let scan = laser_scan_from_msg(msg).unwrap();
        assert_eq!(scan.angle_min, -1.5);
        assert_eq!(scan.angle_increment, 0.5);
        assert_eq!(scan.range_max, 12.0);
        assert_eq!(scan.ranges.len(), 3);
        assert_eq!(scan.ranges[0], 1.0);
        assert!(scan.ranges[1].is_nan());
        assert_eq!(scan.ranges[2], 2.5);
    }

    #[test]
    fn laser_scan_missing_field_is_parse_error() {
        let result = laser_scan_from_msg(json!({ "ranges": [1.0] }));
        assert!(matches!(result, Err(LidarError::Parsing(_))));
    }

    #[test]
    fn laser_scan_encodes_non_finite_as_null() {
        let scan = LaserScanData {
            angle_min: -1.0,
            angle_increment: 0.5,
            range_max: 10.0,
            ranges: vec![1.0, f32::NAN, f32::INFINITY, 2.0],
            ..LaserScanData::default()
        };
        let msg = laser_scan_to_msg(&scan);
        let ranges = msg["ranges"].as_array().unwrap();
        assert!(ranges[1].is_null());
        assert!(ranges[2].is_null());
        assert!(close(&ranges[3], 2.0));
    }

    #[test]
    fn laser_scan_metadata_survives_decode_and_encode() {
        let msg = json!({
            "header": { "frame_id": "base_scan", "stamp": { "sec": 1700, "nanosec": 250 } },
            "angle_min": -1.5,
            "angle_max": 1.75,
            "angle_increment": 0.5,
            "time_increment": 0.001,
            "scan_time": 0.2,
            "range_min": 0.12,
            "range_max": 12.0,
            "ranges": [1.0, 2.0],
            "intensities": []
        });
        let scan = laser_scan_from_msg(msg).unwrap();
        assert_eq!(scan.header.frame_id, "base_scan");
        assert_eq!(scan.header.stamp.sec, 1700);

        let out = laser_scan_to_msg(&scan);
        assert_eq!(out["header"]["frame_id"], "base_scan");
        assert_eq!(out["header"]["stamp"]["sec"], 1700);
        assert_eq!(out["header"]["stamp"]["nanosec"], 250);
        assert!(close(&out["angle_max"], 1.75), "sensor angle_max is kept");
        assert!(close(&out["time_increment"], 0.001));
        assert!(close(&out["scan_time"], 0.2));
        assert!(close(&out["range_min"], 0.12));
        assert!(close(&out["range_max"], 12.0));
    }

    #[test]
    fn laser_scan_without_angle_max_uses_last_bearing() {
        let msg = json!({
            "angle_min": -1.0,
            "angle_increment": 0.5,
            "range_max": 10.0,
            "ranges": [1.0, 1.0, 1.0, 1.0]
        });
        let scan = laser_scan_from_msg(msg).unwrap();
        assert_eq!(scan.angle_max, 0.5);
        assert_eq!(scan.header.frame_id, "");
    }

    #[test]
    fn odometry_reads_pose_only() {
        let msg = json!({
            "header": { "frame_id": "odom" },
            "child_frame_id": "base_link",
            "pose": {
                "pose": {
                    "position": { "x": 1.5, "y": -2.0, "z": 0.0 },
                    "orientation": { "x": 0.0, "y": 0.0, "z": 0.5, "w": 0.5 }
                },
                "covariance": []
            },
            "twist": { "twist": { "linear": { "x": 9.0 } } }
        });
        let odom = odometry_from_msg(msg).unwrap();
        assert_eq!(odom.position_x, 1.5);
        assert_eq!(odom.position_y, -2.0);
        assert_eq!(odom.orientation, [0.0, 0.0, 0.5, 0.5]);
    }

    #[test]
    fn odometry_without_pose_is_parse_error() {
        let result = odometry_from_msg(json!({ "twist": {} }));
        assert!(matches!(result, Err(LidarError::Parsing(_))));
    }

    #[test]
    fn marker_carries_fixed_fields() {
        let msg = marker_to_msg(&CylinderMarker::at(3.0, -1.0));
        assert_eq!(msg["header"]["frame_id"], "map");
        assert!(msg["header"]["stamp"]["sec"].as_i64().is_some_and(|s| s > 0));
        assert!(msg["header"]["stamp"]["nanosec"].is_u64());
        assert_eq!(msg["ns"], "cylinder");
        assert_eq!(msg["id"], 0);
        assert_eq!(msg["type"], MARKER_TYPE_CYLINDER);
        assert_eq!(msg["action"], MARKER_ACTION_ADD);
        assert!(close(&msg["pose"]["position"]["x"], 3.0));
        assert!(close(&msg["pose"]["position"]["y"], -1.0));
        assert!(close(&msg["pose"]["position"]["z"], 0.0));
        assert!(close(&msg["pose"]["orientation"]["w"], 1.0));
        assert!(close(&msg["scale"]["x"], 0.3));
        assert!(close(&msg["scale"]["z"], 0.5));
        assert!(close(&msg["color"]["g"], 0.2));
        assert!(close(&msg["color"]["b"], 1.0));
    }

    #[test]
    fn envelopes_carry_op_topic_and_type() {
        let sub = subscribe_op("/scan", LASER_SCAN_TYPE);
        assert_eq!(sub["op"], "subscribe");
        assert_eq!(sub["topic"], "/scan");
        assert_eq!(sub["type"], LASER_SCAN_TYPE);

        let adv = advertise_op("/single_cylinder_marker", MARKER_TYPE);
        assert_eq!(adv["op"], "advertise");

        let publish = publish_op("/x", json!({ "data": 1 }));
        assert_eq!(publish["msg"]["data"], 1);
    }

    #[test]
    fn non_publish_frames_have_no_payload() {
        let status = parse_frame(r#"{"op":"status","level":"warning","msg":"x"}"#).unwrap();
        assert!(status.into_publish().is_none());

        let publish = parse_frame(r#"{"op":"publish","topic":"/odom","msg":{}}"#).unwrap();
        let (topic, _) = publish.into_publish().unwrap();
        assert_eq!(topic, "/odom");
    }

    #[test]
    fn garbage_frame_is_parse_error() {
        assert!(matches!(parse_frame("not json"), Err(LidarError::Parsing(_))));
        assert!(matches!(parse_frame(r#"{"topic":"/scan"}"#), Err(LidarError::Parsing(_))));
    }
}
