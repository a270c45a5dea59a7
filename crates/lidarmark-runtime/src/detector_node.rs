//! [`DetectorNode`] – the scan-to-marker pipeline on the event bus.
//!
//! Two inputs, one output:
//!
//! | Topic | Direction | Handling |
//! |---|---|---|
//! | [`Topic::Odometry`] | in | overwrite the cached pose |
//! | [`Topic::Scan`] | in | detect, transform to world, emit marker |
//! | [`Topic::Markers`] | out | at most one marker per scan |
//!
//! Both inputs are consumed by a single task, so the pose never changes
//! during a detection pass.  Before each scan the odometry already buffered
//! is applied, so a scan sees the newest pose known at that moment without
//! a busy odometry stream holding scans back.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lidarmark_middleware::EventBus;
//! use lidarmark_perception::CylinderDetector;
//! use lidarmark_runtime::detector_node::DetectorNode;
//!
//! # async fn demo() {
//! let bus = Arc::new(EventBus::default());
//! let node = DetectorNode::new(Arc::clone(&bus), CylinderDetector::default());
//! tokio::spawn(node.run());
//! # }
//! ```

use std::sync::Arc;

use lidarmark_middleware::{EventBus, Topic, TopicReceiver};
use lidarmark_perception::{
    CylinderDetector, Pose2D, PoseReader, PoseWriter, RangeScan, pose_cell,
};
use lidarmark_types::{CylinderMarker, Event, EventPayload, LaserScanData, LidarError, OdometryData};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, info, warn};

use crate::convert::range_scan_from;

pub const DETECTOR_SOURCE: &str = "lidarmark-runtime::detector";

/// Buffered odometry events applied ahead of one scan, at most.
const POSE_CATCH_UP_LIMIT: usize = 64;

/// Run one detection pass: find the cylinder in `scan` and place it in the
/// world using `pose`.
pub fn locate_cylinder(
    detector: &CylinderDetector,
    scan: &RangeScan,
    pose: Pose2D,
) -> Option<CylinderMarker> {
    let detection = detector.detect(scan)?;
    let world = pose.transform_point(detection.center);
    debug!(
        local_x = detection.center.x,
        local_y = detection.center.y,
        chord = detection.chord_length,
        points = detection.point_count,
        "cylinder segment accepted"
    );
    Some(CylinderMarker::at(world.x, world.y))
}

pub struct DetectorNode {
    bus: Arc<EventBus>,
    detector: CylinderDetector,
    pose_writer: PoseWriter,
    pose_reader: PoseReader,
    scans: TopicReceiver,
    odometry: TopicReceiver,
}

impl DetectorNode {
    /// Create the node and subscribe to its input topics right away, so
    /// events published after this call are not missed.
    pub fn new(bus: Arc<EventBus>, detector: CylinderDetector) -> Self {
        let (pose_writer, pose_reader) = pose_cell();
        let scans = bus.subscribe_to(Topic::Scan);
        let odometry = bus.subscribe_to(Topic::Odometry);
        Self {
            bus,
            detector,
            pose_writer,
            pose_reader,
            scans,
            odometry,
        }
    }

    /// Read end of the node's pose cache.
    pub fn pose_reader(&self) -> PoseReader {
        self.pose_reader.clone()
    }

    pub fn handle_odometry(&self, odom: &OdometryData) {
        let pose =
            Pose2D::from_position_quaternion(odom.position_x, odom.position_y, odom.orientation);
        self.pose_writer.set(pose);
    }

    /// Detect in `scan` and publish the marker, if any, on
    /// [`Topic::Markers`].
    pub fn handle_scan(&self, scan: &LaserScanData) -> Option<CylinderMarker> {
        let snapshot = self.pose_reader.snapshot();
        if snapshot.is_default() {
            debug!("no odometry received yet, using identity pose");
        }

        let Some(marker) = locate_cylinder(&self.detector, &range_scan_from(scan), snapshot.pose)
        else {
            debug!(readings = scan.ranges.len(), "no cylinder in scan");
            return None;
        };

        info!(
            x = marker.position[0],
            y = marker.position[1],
            "cylinder detected"
        );
        let event = Event::new(DETECTOR_SOURCE, EventPayload::CylinderMarker(marker.clone()));
        if let Err(LidarError::Channel(reason)) = self.bus.publish_to(Topic::Markers, event) {
            debug!(reason = %reason, "marker published without subscribers");
        }
        Some(marker)
    }

    /// Consume both input topics until the bus shuts down.
    pub async fn run(mut self) -> Result<(), LidarError> {
        loop {
            tokio::select! {
                result = self.odometry.recv() => match result {
                    Ok(event) => {
                        if let EventPayload::Odometry(odom) = event.payload {
                            self.handle_odometry(&odom);
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(lagged_by = n, "odometry subscriber lagged");
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
                result = self.scans.recv() => match result {
                    Ok(event) => {
                        if let EventPayload::LaserScan(scan) = event.payload {
                            self.apply_pending_odometry();
                            self.handle_scan(&scan);
                        }
                    }
                    // Newer scans supersede the dropped ones.
                    Err(RecvError::Lagged(n)) => {
                        warn!(dropped = n, "scan subscriber lagged, dropping old scans");
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
            }
        }
    }

    fn apply_pending_odometry(&mut self) {
        for _ in 0..POSE_CATCH_UP_LIMIT {
            match self.odometry.try_recv() {
                Ok(event) => {
                    if let EventPayload::Odometry(odom) = event.payload {
                        self.handle_odometry(&odom);
                    }
                }
                Err(TryRecvError::Lagged(n)) => {
                    warn!(lagged_by = n, "odometry subscriber lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_1_SQRT_2;
    use std::time::Duration;

    /// Four readings straight ahead, chord 0.3125, midpoint x = 2.15625.
    fn cylinder_scan() -> LaserScanData {
        LaserScanData {
            angle_min: 0.0,
            angle_increment: 0.0,
            range_max: 10.0,
            ranges: vec![2.0, 2.125, 2.25, 2.3125],
            ..LaserScanData::default()
        }
    }

    fn wall_scan() -> LaserScanData {
        LaserScanData {
            angle_min: 0.0,
            angle_increment: 0.0,
            range_max: 10.0,
            ranges: vec![2.0, 2.5, 3.0],
            ..LaserScanData::default()
        }
    }

    /// At (2, 3), facing +Y.
    fn facing_y() -> OdometryData {
        OdometryData {
            position_x: 2.0,
            position_y: 3.0,
            position_z: 0.0,
            orientation: [0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2],
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn locate_cylinder_places_center_in_world() {
        let marker = locate_cylinder(
            &CylinderDetector::default(),
            &range_scan_from(&cylinder_scan()),
            Pose2D::new(1.0, 1.0, 0.0),
        )
        .unwrap();
        assert!(close(marker.position[0], 3.15625));
        assert!(close(marker.position[1], 1.0));
        assert_eq!(marker.position[2], 0.0);
    }

    #[test]
    fn scan_before_any_odometry_uses_identity_pose() {
        let bus = Arc::new(EventBus::default());
        let node = DetectorNode::new(bus, CylinderDetector::default());

        let marker = node.handle_scan(&cylinder_scan()).unwrap();
        assert!(close(marker.position[0], 2.15625));
        assert!(close(marker.position[1], 0.0));
    }

    #[test]
    fn odometry_updates_the_pose_used_by_scans() {
        let bus = Arc::new(EventBus::default());
        let node = DetectorNode::new(bus, CylinderDetector::default());

        node.handle_odometry(&facing_y());
        assert_eq!(node.pose_reader().snapshot().updates, 1);

        let marker = node.handle_scan(&cylinder_scan()).unwrap();
        assert!(close(marker.position[0], 2.0), "x={}", marker.position[0]);
        assert!(close(marker.position[1], 5.15625), "y={}", marker.position[1]);
    }

    #[tokio::test]
    async fn no_match_publishes_nothing() {
        let bus = Arc::new(EventBus::default());
        let mut markers = bus.subscribe_to(Topic::Markers);
        let node = DetectorNode::new(Arc::clone(&bus), CylinderDetector::default());

        assert!(node.handle_scan(&wall_scan()).is_none());

        let result = tokio::time::timeout(Duration::from_millis(50), markers.recv()).await;
        assert!(result.is_err(), "no marker expected for a wall");
    }

    #[tokio::test]
    async fn end_to_end_odometry_then_scan_yields_one_marker() {
        let bus = Arc::new(EventBus::default());
        let mut markers = bus.subscribe_to(Topic::Markers);
        let node = DetectorNode::new(Arc::clone(&bus), CylinderDetector::default());
        let handle = tokio::spawn(node.run());

        bus.publish_to(
            Topic::Odometry,
            Event::new("test", EventPayload::Odometry(facing_y())),
        )
        .unwrap();
        bus.publish_to(
            Topic::Scan,
            Event::new("test", EventPayload::LaserScan(cylinder_scan())),
        )
        .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), markers.recv())
            .await
            .expect("marker must be published")
            .unwrap();
        assert_eq!(event.source, DETECTOR_SOURCE);
        let EventPayload::CylinderMarker(marker) = event.payload else {
            panic!("expected CylinderMarker payload");
        };
        assert!(close(marker.position[0], 2.0), "x={}", marker.position[0]);
        assert!(close(marker.position[1], 5.15625), "y={}", marker.position[1]);

        let second = tokio::time::timeout(Duration::from_millis(50), markers.recv()).await;
        assert!(second.is_err(), "exactly one marker per scan");

        handle.abort();
    }

    #[tokio::test]
    async fn scans_are_handled_while_odometry_keeps_arriving() {
        let bus = Arc::new(EventBus::default());
        let mut markers = bus.subscribe_to(Topic::Markers);
        let node = DetectorNode::new(Arc::clone(&bus), CylinderDetector::default());
        let handle = tokio::spawn(node.run());

        // Bursts larger than the per-poll budget keep odometry ready every
        // time the node runs.
        let odom_bus = Arc::clone(&bus);
        let odometry = tokio::spawn(async move {
            loop {
                for _ in 0..200 {
                    let _ = odom_bus.publish_to(
                        Topic::Odometry,
                        Event::new("test", EventPayload::Odometry(facing_y())),
                    );
                }
                tokio::task::yield_now().await;
            }
        });
        tokio::task::yield_now().await;

        bus.publish_to(
            Topic::Scan,
            Event::new("test", EventPayload::LaserScan(cylinder_scan())),
        )
        .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), markers.recv())
            .await
            .expect("scan must not wait behind odometry")
            .unwrap();
        let EventPayload::CylinderMarker(marker) = event.payload else {
            panic!("expected CylinderMarker payload");
        };
        assert!(close(marker.position[0], 2.0), "x={}", marker.position[0]);
        assert!(close(marker.position[1], 5.15625), "y={}", marker.position[1]);

        odometry.abort();
        handle.abort();
    }
}
