//! ROS 2 adapter speaking the rosbridge protocol.
//!
//! [`Ros2Adapter`] bridges between the internal [`EventBus`] and a rosbridge
//! server:
//!
//! * **Inbound (Perception)** – `publish` frames on the scan and odometry
//!   topics are decoded and published as [`EventPayload::LaserScan`] /
//!   [`EventPayload::Odometry`] events on the bus.
//!
//! * **Outbound (Visualisation)** – markers and decimated scans are encoded
//!   as rosbridge `publish` frames and queued on the outbound channel that
//!   the WebSocket writer drains.

use std::sync::Arc;

use async_trait::async_trait;
use lidarmark_types::{
    CylinderMarker, Event, EventPayload, LaserScanData, LidarError, OdometryData,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::adapter::LandmarkAdapter;
use crate::bus::{EventBus, Topic};
use crate::ros_msgs::{
    self, LASER_SCAN_TYPE, MARKER_TYPE, ODOMETRY_TYPE, RosTopics, advertise_op, publish_op,
    subscribe_op,
};

/// Maximum number of LiDAR range readings accepted in a single scan.
///
/// Payloads with more entries than this are rejected to prevent memory
/// exhaustion from malformed or malicious scan messages.
pub const MAX_LIDAR_RANGES: usize = 8192;

pub const SCAN_SOURCE: &str = "lidarmark-middleware::ros2/scan";
pub const ODOM_SOURCE: &str = "lidarmark-middleware::ros2/odom";

/// Adapter that translates bus traffic to and from rosbridge frames.
pub struct Ros2Adapter {
    bus: Arc<EventBus>,
    topics: RosTopics,
    outbound: mpsc::Sender<String>,
}

impl Ros2Adapter {
    /// Create a new [`Ros2Adapter`] backed by the given [`EventBus`].
    /// Encoded frames are queued on `outbound`.
    pub fn new(bus: Arc<EventBus>, topics: RosTopics, outbound: mpsc::Sender<String>) -> Self {
        Self {
            bus,
            topics,
            outbound,
        }
    }

    /// Frames to send right after connecting: advertise both output topics
    /// and subscribe to both input topics.
    pub fn handshake_frames(&self) -> Vec<String> {
        [
            advertise_op(&self.topics.marker, MARKER_TYPE),
            advertise_op(&self.topics.decimated, LASER_SCAN_TYPE),
            subscribe_op(&self.topics.scan, LASER_SCAN_TYPE),
            subscribe_op(&self.topics.odom, ODOMETRY_TYPE),
        ]
        .iter()
        .map(Value::to_string)
        .collect()
    }

    /// Publish a laser scan on [`Topic::Scan`].
    pub fn ingest_laser_scan(&self, scan: LaserScanData) -> Result<usize, LidarError> {
        // ── Input validation ───────────────────────────────────────────────
        if scan.ranges.len() > MAX_LIDAR_RANGES {
            return Err(LidarError::Parsing(format!(
                "laser scan has {} range readings, exceeding the limit of {}",
                scan.ranges.len(),
                MAX_LIDAR_RANGES,
            )));
        }
        self.bus.publish_to(
            Topic::Scan,
            Event::new(SCAN_SOURCE, EventPayload::LaserScan(scan)),
        )
    }

    /// Publish an odometry pose on [`Topic::Odometry`].
    pub fn ingest_odometry(&self, odom: OdometryData) -> Result<usize, LidarError> {
        self.bus.publish_to(
            Topic::Odometry,
            Event::new(ODOM_SOURCE, EventPayload::Odometry(odom)),
        )
    }

    /// Route one inbound rosbridge text frame.
    ///
    /// Returns the bus topic the frame was published to, or `None` for
    /// frames that are not a `publish` on a subscribed topic.  Having no bus
    /// subscriber is not an error here.
    pub fn handle_frame(&self, text: &str) -> Result<Option<Topic>, LidarError> {
        let Some((topic, msg)) = ros_msgs::parse_frame(text)?.into_publish() else {
            return Ok(None);
        };

        let (bus_topic, published) = if topic == self.topics.scan {
            let scan = ros_msgs::laser_scan_from_msg(msg)?;
            (Topic::Scan, self.ingest_laser_scan(scan))
        } else if topic == self.topics.odom {
            let odom = ros_msgs::odometry_from_msg(msg)?;
            (Topic::Odometry, self.ingest_odometry(odom))
        } else {
            debug!(topic = %topic, "ignoring frame on unrouted topic");
            return Ok(None);
        };

        match published {
            Ok(_) | Err(LidarError::Channel(_)) => Ok(Some(bus_topic)),
            Err(e) => Err(e),
        }
    }

    async fn queue(&self, frame: Value) -> Result<(), LidarError> {
        self.outbound
            .send(frame.to_string())
            .await
            .map_err(|_| LidarError::Transport("outbound frame queue closed".to_string()))
    }
}

#[async_trait]
impl LandmarkAdapter for Ros2Adapter {
    async fn publish_marker(&self, marker: &CylinderMarker) -> Result<(), LidarError> {
        self.queue(publish_op(&self.topics.marker, ros_msgs::marker_to_msg(marker)))
            .await
    }

    async fn publish_scan(&self, scan: &LaserScanData) -> Result<(), LidarError> {
        self.queue(publish_op(
            &self.topics.decimated,
            ros_msgs::laser_scan_to_msg(scan),
        ))
        .await
    }
}
