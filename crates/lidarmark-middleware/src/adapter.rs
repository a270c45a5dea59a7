//! The adapter seam between the internal bus and the outside world.
//!
//! lidarmark never speaks directly to ROS.  Detection results are published
//! on the internal [`EventBus`][crate::bus::EventBus]; an adapter listens for
//! them and translates them into the wire protocol of the robot stack.
//!
//! - [`LandmarkAdapter`] – the trait every adapter must implement.
//! - [`Ros2Adapter`][crate::ros2_adapter::Ros2Adapter] – rosbridge JSON over
//!   a WebSocket.

use async_trait::async_trait;
use lidarmark_types::{CylinderMarker, LaserScanData, LidarError};

/// Every outbound-protocol adapter must implement this trait.
///
/// # Contract
///
/// * `publish_marker` – emit a landmark marker.  Fire-and-forget: success
///   means the frame was queued, not that anyone received it.
///
/// * `publish_scan` – emit a (decimated) scan on the adapter's output scan
///   topic.
#[async_trait]
pub trait LandmarkAdapter: Send + Sync {
    async fn publish_marker(&self, marker: &CylinderMarker) -> Result<(), LidarError>;

    async fn publish_scan(&self, scan: &LaserScanData) -> Result<(), LidarError>;
}
