//! `lidarmark-perception` – single-cylinder detection from planar range scans.
//!
//! Turns one laser sweep plus the latest robot pose into the world-frame
//! position of a cylindrical landmark of known diameter.
//!
//! # Modules
//!
//! - [`scan`] – [`RangeScan`][scan::RangeScan] and [`Point2D`][scan::Point2D]:
//!   polar readings, validity rules, Cartesian conversion, decimation.
//! - [`segmenter`] – [`Segmenter`][segmenter::Segmenter]: lazily groups
//!   consecutive valid points into proximity [`Segment`][segmenter::Segment]s.
//! - [`cylinder`] – [`CylinderDetector`][cylinder::CylinderDetector]: first
//!   segment whose endpoint chord matches the expected diameter, reported at
//!   the chord midpoint.
//! - [`transform`] – [`Pose2D`][transform::Pose2D]: planar pose, quaternion
//!   yaw extraction, local-to-world point transform.
//! - [`pose_cache`] – [`pose_cell`][pose_cache::pose_cell]: single-writer /
//!   multi-reader slot holding the most recent pose.
//!
//! This crate performs no I/O and never fails: "nothing detected" is `None`.

pub mod cylinder;
pub mod pose_cache;
pub mod scan;
pub mod segmenter;
pub mod transform;

pub use cylinder::{CylinderDetector, CylinderSpec, Detection};
pub use pose_cache::{pose_cell, PoseReader, PoseSnapshot, PoseWriter};
pub use scan::{Point2D, RangeScan};
pub use segmenter::{Segment, Segmenter};
pub use transform::Pose2D;
