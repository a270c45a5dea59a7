//! `lidarmark-middleware` – bus and ROS transport.
//!
//! Routes scans, poses and markers between the detector and a rosbridge
//! server without caring about what the data means.
//!
//! # Modules
//!
//! - [`bus`] – Typed, topic-based publish/subscribe event bus built on Tokio
//!   broadcast channels.
//! - [`ros_msgs`] – rosbridge JSON codec for LaserScan, Odometry and Marker.
//! - [`adapter`] – [`LandmarkAdapter`], the outbound-protocol seam.
//! - [`ros2_adapter`] – [`Ros2Adapter`]: frames ↔ bus events.
//! - [`rosbridge`] – [`RosbridgeClient`]: the WebSocket session.

pub mod adapter;
pub mod bus;
pub mod ros2_adapter;
pub mod ros_msgs;
pub mod rosbridge;

pub use adapter::LandmarkAdapter;
pub use bus::{EventBus, Topic, TopicReceiver};
pub use ros2_adapter::{MAX_LIDAR_RANGES, Ros2Adapter};
pub use ros_msgs::RosTopics;
pub use rosbridge::RosbridgeClient;
