//! Cylinder validation and local-frame detection.
//!
//! A [`Segment`] is accepted as a cylinder of diameter `D` when the straight
//! distance between its first and last point (the *chord*) is within `ε` of
//! `D`.  Only the endpoints are inspected: convexity, point density and arc
//! curvature are not checked.
//!
//! [`CylinderDetector::detect`] runs the [`Segmenter`] and returns the first
//! matching segment in angular order.  Later segments of the same scan are
//! never evaluated.
//!
//! # Example
//!
//! ```rust
//! use lidarmark_perception::cylinder::CylinderDetector;
//! use lidarmark_perception::scan::RangeScan;
//!
//! // Readings on the +X axis: a 0.3 m wide cluster from 2.0 to 2.3.
//! let scan = RangeScan::new(vec![2.0, 2.1, 2.2, 2.3], 0.0, 0.0, 10.0);
//! let detection = CylinderDetector::default().detect(&scan).unwrap();
//! assert!((detection.center.x - 2.15).abs() < 1e-5);
//! ```

use tracing::trace;

use crate::scan::{Point2D, RangeScan};
use crate::segmenter::{Segment, Segmenter};

/// Expected cylinder diameter (metres).
pub const DEFAULT_DIAMETER: f64 = 0.30;

/// Allowed absolute deviation of the chord from [`DEFAULT_DIAMETER`].
pub const DEFAULT_TOLERANCE: f64 = 0.05;

// ────────────────────────────────────────────────────────────────────────────
// CylinderSpec
// ────────────────────────────────────────────────────────────────────────────

/// Physical signature of the landmark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderSpec {
    pub diameter: f64,
    pub tolerance: f64,
}

impl Default for CylinderSpec {
    fn default() -> Self {
        Self {
            diameter: DEFAULT_DIAMETER,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl CylinderSpec {
    pub fn new(diameter: f64, tolerance: f64) -> Self {
        Self {
            diameter,
            tolerance,
        }
    }

    /// `|chord − diameter| ≤ tolerance`.  Segments with fewer than two points
    /// never match.
    pub fn matches(&self, segment: &Segment) -> bool {
        segment.len() > 1 && (segment.chord_length() - self.diameter).abs() <= self.tolerance
    }
}

/// Midpoint of the segment's first and last point.
///
/// This is the centre of the visible chord, not of the object and not the
/// centroid of all points.
pub fn center_point(segment: &Segment) -> Point2D {
    segment.first().midpoint(segment.last())
}

// ────────────────────────────────────────────────────────────────────────────
// Detection
// ────────────────────────────────────────────────────────────────────────────

/// A cylinder found in one scan, in the sensor-local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Chord midpoint, sensor-local frame.
    pub center: Point2D,
    pub chord_length: f64,
    pub point_count: usize,
    /// Scan index range `[first, last]` of the matching segment.
    pub first_index: usize,
    pub last_index: usize,
}

impl Detection {
    fn from_segment(segment: &Segment) -> Self {
        Self {
            center: center_point(segment),
            chord_length: segment.chord_length(),
            point_count: segment.len(),
            first_index: segment.first_index(),
            last_index: segment.last_index(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// CylinderDetector
// ────────────────────────────────────────────────────────────────────────────

/// Segmenter + validator: finds at most one cylinder per scan.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CylinderDetector {
    segmenter: Segmenter,
    spec: CylinderSpec,
}

impl CylinderDetector {
    pub fn new(segmenter: Segmenter, spec: CylinderSpec) -> Self {
        Self { segmenter, spec }
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    pub fn spec(&self) -> &CylinderSpec {
        &self.spec
    }

    /// Return the first segment of `scan` that matches the [`CylinderSpec`].
    ///
    /// Returns `None` for empty scans, all-invalid scans, and scans without a
    /// matching segment.
    pub fn detect(&self, scan: &RangeScan) -> Option<Detection> {
        for segment in self.segmenter.segments(scan) {
            if self.spec.matches(&segment) {
                return Some(Detection::from_segment(&segment));
            }
            trace!(
                first_index = segment.first_index(),
                last_index = segment.last_index(),
                chord = segment.chord_length(),
                "segment rejected"
            );
        }
        None
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
