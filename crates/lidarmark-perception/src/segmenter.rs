//! Proximity segmentation of a range scan.
//!
//! The [`Segmenter`] walks a [`RangeScan`] in angular order and groups
//! consecutive valid points into [`Segment`]s.  A point joins the current
//! segment when it lies closer than `proximity_threshold` to the segment's
//! last point; otherwise the current segment is closed and a new one starts.
//!
//! Invalid readings are skipped without closing the current segment, so a
//! single dropped ray in the middle of an object does not split it.  The scan
//! is treated as open: the last and first readings are never joined.
//!
//! Segmentation is lazy.  [`Segmenter::segments`] returns an iterator that
//! only advances as far through the scan as the consumer pulls, which lets
//! a first-match search stop early.
//!
//! # Example
//!
//! ```rust
//! use lidarmark_perception::scan::RangeScan;
//! use lidarmark_perception::segmenter::Segmenter;
//!
//! // Two clusters, 0.01 rad apart within each and a jump in range between.
//! let scan = RangeScan::new(vec![1.0, 1.0, 1.0, 5.0, 5.0], 0.0, 0.01, 10.0);
//! let segments: Vec<_> = Segmenter::default().segments(&scan).collect();
//! assert_eq!(segments.len(), 2);
//! assert_eq!(segments[0].len(), 3);
//! ```

use crate::scan::{Point2D, RangeScan};

/// Default maximum gap between neighbouring points of one segment (metres).
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 1.0;

// ────────────────────────────────────────────────────────────────────────────
// Segment
// ────────────────────────────────────────────────────────────────────────────

/// A run of spatially contiguous scan points.
///
/// Always holds at least one point; the segments yielded by [`Segments`]
/// hold at least two.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    points: Vec<Point2D>,
    first_index: usize,
    last_index: usize,
}

impl Segment {
    fn start(index: usize, point: Point2D) -> Self {
        Self {
            points: vec![point],
            first_index: index,
            last_index: index,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_points(first_index: usize, points: Vec<Point2D>) -> Self {
        let last_index = first_index + points.len().saturating_sub(1);
        Self {
            points,
            first_index,
            last_index,
        }
    }

    fn push(&mut self, index: usize, point: Point2D) {
        self.points.push(point);
        self.last_index = index;
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Never true for a constructed segment; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Point2D {
        self.points[0]
    }

    pub fn last(&self) -> Point2D {
        self.points[self.points.len() - 1]
    }

    /// Scan index of the first point.
    pub fn first_index(&self) -> usize {
        self.first_index
    }

    /// Scan index of the last point.
    pub fn last_index(&self) -> usize {
        self.last_index
    }

    /// Straight-line distance between the first and last point.
    pub fn chord_length(&self) -> f64 {
        self.first().distance_to(self.last())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Segmenter
// ────────────────────────────────────────────────────────────────────────────

/// Splits scans into proximity segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segmenter {
    proximity_threshold: f64,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(DEFAULT_PROXIMITY_THRESHOLD)
    }
}

impl Segmenter {
    pub fn new(proximity_threshold: f64) -> Self {
        Self {
            proximity_threshold,
        }
    }

    pub fn proximity_threshold(&self) -> f64 {
        self.proximity_threshold
    }

    /// Lazily segment `scan`.  Single-point segments are dropped.
    pub fn segments<'a>(&self, scan: &'a RangeScan) -> Segments<'a> {
        Segments {
            scan,
            next_index: 0,
            current: None,
            proximity_threshold: self.proximity_threshold,
        }
    }
}

/// Iterator returned by [`Segmenter::segments`].
#[derive(Debug)]
pub struct Segments<'a> {
    scan: &'a RangeScan,
    next_index: usize,
    current: Option<Segment>,
    proximity_threshold: f64,
}

impl Segments<'_> {
    /// Close the in-progress segment (if any) and open a new one at `point`.
    /// Returns the closed segment when it is long enough to hand downstream.
    fn restart(&mut self, index: usize, point: Point2D) -> Option<Segment> {
        self.current
            .replace(Segment::start(index, point))
            .filter(|s| s.len() > 1)
    }
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        while self.next_index < self.scan.len() {
            let index = self.next_index;
            self.next_index += 1;

            // Invalid readings are skipped but do not break the segment.
            let Some(point) = self.scan.point_at(index) else {
                continue;
            };

            let joins = self
                .current
                .as_ref()
                .is_some_and(|s| s.last().distance_to(point) < self.proximity_threshold);

            if joins {
                if let Some(segment) = self.current.as_mut() {
                    segment.push(index, point);
                }
            } else if let Some(closed) = self.restart(index, point) {
                return Some(closed);
            }
        }

        // End of scan: flush whatever is in progress.
        self.current.take().filter(|s| s.len() > 1)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
