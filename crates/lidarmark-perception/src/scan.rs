//! Range scans and the planar points derived from them.
//!
//! A [`RangeScan`] is one sweep of a planar range sensor: `N` distance
//! readings taken at evenly spaced bearings starting at `angle_min`.  Reading
//! `i` lies at bearing `angle_min + i * angle_increment`.
//!
//! A reading is *valid* only when it is finite and strictly below
//! `range_max`; invalid readings never produce a [`Point2D`].
//!
//! # Example
//!
//! ```rust
//! use lidarmark_perception::scan::RangeScan;
//!
//! let scan = RangeScan::new(vec![1.0, f32::NAN, 2.0], 0.0, 0.1, 10.0);
//! assert_eq!(scan.points().count(), 2);
//!
//! let p = scan.point_at(0).unwrap();
//! assert!((p.x - 1.0).abs() < 1e-9);
//! ```

// ────────────────────────────────────────────────────────────────────────────
// Point2D
// ────────────────────────────────────────────────────────────────────────────

/// A point in a planar frame (sensor-local or world).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Point halfway between `self` and `other`.
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RangeScan
// ────────────────────────────────────────────────────────────────────────────

/// One complete sweep of range readings.
///
/// Scans are replaced wholesale; nothing in this crate mutates a scan after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeScan {
    ranges: Vec<f32>,
    angle_min: f32,
    angle_increment: f32,
    range_max: f32,
}

impl RangeScan {
    pub fn new(ranges: Vec<f32>, angle_min: f32, angle_increment: f32, range_max: f32) -> Self {
        Self {
            ranges,
            angle_min,
            angle_increment,
            range_max,
        }
    }

    pub fn ranges(&self) -> &[f32] {
        &self.ranges
    }

    pub fn angle_min(&self) -> f32 {
        self.angle_min
    }

    pub fn angle_increment(&self) -> f32 {
        self.angle_increment
    }

    pub fn range_max(&self) -> f32 {
        self.range_max
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Bearing of reading `index` (radians).
    pub fn angle_at(&self, index: usize) -> f64 {
        f64::from(self.angle_min) + f64::from(self.angle_increment) * index as f64
    }

    /// `true` if reading `index` exists, is finite, and is below `range_max`.
    pub fn is_valid(&self, index: usize) -> bool {
        self.ranges
            .get(index)
            .is_some_and(|r| r.is_finite() && *r < self.range_max)
    }

    /// Cartesian position of reading `index`, or `None` if it is invalid.
    pub fn point_at(&self, index: usize) -> Option<Point2D> {
        if !self.is_valid(index) {
            return None;
        }
        let range = f64::from(self.ranges[index]);
        let angle = self.angle_at(index);
        Some(Point2D::new(range * angle.cos(), range * angle.sin()))
    }

    /// All valid readings in angular order, as `(index, point)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (usize, Point2D)> + '_ {
        (0..self.ranges.len()).filter_map(|i| self.point_at(i).map(|p| (i, p)))
    }

    /// Keep every `step`-th reading, starting with the first.
    ///
    /// The angular increment grows by the same factor so that the retained
    /// readings keep their original bearings.  A `step` of 0 or 1 returns an
    /// unchanged copy.
    pub fn decimate(&self, step: usize) -> Self {
        if step <= 1 {
            return self.clone();
        }
        Self {
            ranges: self.ranges.iter().copied().step_by(step).collect(),
            angle_min: self.angle_min,
            angle_increment: self.angle_increment * step as f32,
            range_max: self.range_max,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn point_distance_and_midpoint() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < 1e-9);

        let m = a.midpoint(b);
        assert!((m.x - 1.5).abs() < 1e-9);
        assert!((m.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn validity_excludes_non_finite_and_max_range() {
        let scan = RangeScan::new(
            vec![1.0, f32::NAN, f32::INFINITY, 10.0, 12.0, 9.99],
            0.0,
            0.1,
            10.0,
        );
        assert!(scan.is_valid(0));
        assert!(!scan.is_valid(1));
        assert!(!scan.is_valid(2));
        assert!(!scan.is_valid(3), "reading equal to range_max is invalid");
        assert!(!scan.is_valid(4));
        assert!(scan.is_valid(5));
        assert!(!scan.is_valid(6), "out-of-bounds index is invalid");
    }

    #[test]
    fn point_at_converts_polar_to_cartesian() {
        let scan = RangeScan::new(vec![2.0, 2.0], 0.0, FRAC_PI_2, 10.0);

        let p0 = scan.point_at(0).unwrap();
        assert!((p0.x - 2.0).abs() < 1e-6);
        assert!(p0.y.abs() < 1e-6);

        let p1 = scan.point_at(1).unwrap();
        assert!(p1.x.abs() < 1e-6, "x={}", p1.x);
        assert!((p1.y - 2.0).abs() < 1e-6, "y={}", p1.y);
    }

    #[test]
    fn points_skips_invalid_and_keeps_indices() {
        let scan = RangeScan::new(vec![f32::NAN, 1.0, 50.0, 1.0], 0.0, 0.01, 10.0);
        let indices: Vec<usize> = scan.points().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![1, 3]);
    }

    #[test]
    fn empty_scan_has_no_points() {
        let scan = RangeScan::new(Vec::new(), 0.0, 0.1, 10.0);
        assert!(scan.is_empty());
        assert_eq!(scan.points().count(), 0);
    }

    #[test]
    fn decimate_keeps_every_nth_reading() {
        let ranges: Vec<f32> = (0..25).map(|i| i as f32).collect();
        let scan = RangeScan::new(ranges, -1.0, 0.01, 100.0);

        let nth = scan.decimate(10);
        assert_eq!(nth.ranges(), &[0.0, 10.0, 20.0]);
        assert!((nth.angle_increment() - 0.1).abs() < 1e-6);
        assert_eq!(nth.angle_min(), -1.0);
        assert_eq!(nth.range_max(), 100.0);

        // Retained readings keep their bearings.
        assert!((nth.angle_at(2) - scan.angle_at(20)).abs() < 1e-6);
    }

    #[test]
    fn decimate_by_one_or_zero_is_identity() {
        let scan = RangeScan::new(vec![1.0, 2.0, 3.0], 0.0, 0.1, 10.0);
        assert_eq!(scan.decimate(1), scan);
        assert_eq!(scan.decimate(0), scan);
    }
}
