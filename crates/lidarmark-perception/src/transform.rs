//! Planar pose and local-to-world transforms.
//!
//! The robot is assumed to move in the plane, so orientation is carried as a
//! single yaw angle.  Full 3-D orientations arriving as unit quaternions are
//! reduced with [`yaw_from_quaternion`], which extracts roll, pitch and yaw
//! from the equivalent rotation matrix and keeps only the yaw.
//!
//! # Example
//!
//! ```rust
//! use lidarmark_perception::scan::Point2D;
//! use lidarmark_perception::transform::Pose2D;
//!
//! // Robot at (2, 3) facing +Y.
//! let pose = Pose2D::new(2.0, 3.0, std::f64::consts::FRAC_PI_2);
//! let world = pose.transform_point(Point2D::new(1.0, 0.0));
//! assert!((world.x - 2.0).abs() < 1e-9);
//! assert!((world.y - 4.0).abs() < 1e-9);
//! ```

use std::f64::consts::FRAC_PI_2;

use crate::scan::Point2D;

// ────────────────────────────────────────────────────────────────────────────
// Quaternion → roll / pitch / yaw
// ────────────────────────────────────────────────────────────────────────────

/// Fixed-axis roll, pitch and yaw (radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollPitchYaw {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl RollPitchYaw {
    /// Decompose the rotation described by quaternion `(x, y, z, w)`.
    ///
    /// The quaternion does not need to be normalised.  A zero quaternion
    /// carries no rotation and yields all-zero angles.  At gimbal lock
    /// (pitch = ±90°) yaw is fixed to zero and the remaining rotation is
    /// reported as roll.
    pub fn from_quaternion(x: f64, y: f64, z: f64, w: f64) -> Self {
        let norm_sq = x * x + y * y + z * z + w * w;
        if norm_sq == 0.0 || !norm_sq.is_finite() {
            return Self {
                roll: 0.0,
                pitch: 0.0,
                yaw: 0.0,
            };
        }

        // Rotation matrix rows, scaled so non-unit quaternions still work.
        let s = 2.0 / norm_sq;
        let (xs, ys, zs) = (x * s, y * s, z * s);
        let (wx, wy, wz) = (w * xs, w * ys, w * zs);
        let (xx, xy, xz) = (x * xs, x * ys, x * zs);
        let (yy, yz, zz) = (y * ys, y * zs, z * zs);

        let m00 = 1.0 - (yy + zz);
        let m10 = xy + wz;
        let m20 = xz - wy;
        let m21 = yz + wx;
        let m22 = 1.0 - (xx + yy);

        if m20.abs() >= 1.0 {
            return Self {
                roll: m21.atan2(m22),
                pitch: if m20 < 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 },
                yaw: 0.0,
            };
        }

        let pitch = -m20.asin();
        let cos_pitch = pitch.cos();
        Self {
            roll: (m21 / cos_pitch).atan2(m22 / cos_pitch),
            pitch,
            yaw: (m10 / cos_pitch).atan2(m00 / cos_pitch),
        }
    }
}

/// Rotation about the vertical axis encoded by quaternion `(x, y, z, w)`.
///
/// Roll and pitch are computed and discarded.
pub fn yaw_from_quaternion(x: f64, y: f64, z: f64, w: f64) -> f64 {
    RollPitchYaw::from_quaternion(x, y, z, w).yaw
}

// ────────────────────────────────────────────────────────────────────────────
// Pose2D
// ────────────────────────────────────────────────────────────────────────────

/// Planar robot pose in the world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    /// Heading, counter-clockwise from world +X (radians).
    pub yaw: f64,
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    /// Zero position, zero rotation.
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Build a planar pose from a 3-D position and orientation quaternion
    /// `[x, y, z, w]`.  The `z` position and any roll/pitch are dropped.
    pub fn from_position_quaternion(x: f64, y: f64, orientation: [f64; 4]) -> Self {
        let [qx, qy, qz, qw] = orientation;
        Self::new(x, y, yaw_from_quaternion(qx, qy, qz, qw))
    }

    /// Map a point expressed in the robot's local frame into the world frame:
    /// rotate by `yaw`, then translate by `(x, y)`.
    pub fn transform_point(&self, local: Point2D) -> Point2D {
        let (sin, cos) = self.yaw.sin_cos();
        Point2D::new(
            self.x + local.x * cos - local.y * sin,
            self.y + local.x * sin + local.y * cos,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
