//! Single-slot cache for the most recent robot pose.
//!
//! [`pose_cell`] creates one shared slot and returns its two ends:
//!
//! - [`PoseWriter`] – the only handle that can overwrite the slot.  It is
//!   deliberately not `Clone`, so the pose stream has exactly one writer.
//! - [`PoseReader`] – cheap to clone; every clone reads the same slot.
//!
//! Until the first write the slot holds [`Pose2D::identity`].  There is no
//! history and no timestamp matching: a reader always gets the latest pose,
//! however old it is.
//!
//! # Example
//!
//! ```rust
//! use lidarmark_perception::pose_cache::pose_cell;
//! use lidarmark_perception::transform::Pose2D;
//!
//! let (writer, reader) = pose_cell();
//! assert_eq!(reader.snapshot().updates, 0);
//!
//! writer.set(Pose2D::new(1.0, 2.0, 0.5));
//! let snap = reader.snapshot();
//! assert_eq!(snap.pose, Pose2D::new(1.0, 2.0, 0.5));
//! assert_eq!(snap.updates, 1);
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use crate::transform::Pose2D;

/// Consistent copy of the cache taken at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSnapshot {
    pub pose: Pose2D,
    /// Number of writes so far; `0` means no pose has been received.
    pub updates: u64,
}

impl PoseSnapshot {
    /// `true` if the pose is the identity default rather than a received one.
    pub fn is_default(&self) -> bool {
        self.updates == 0
    }
}

impl Default for PoseSnapshot {
    fn default() -> Self {
        Self {
            pose: Pose2D::identity(),
            updates: 0,
        }
    }
}

type Slot = Arc<RwLock<PoseSnapshot>>;

/// Create a new pose slot and return its writer and reader ends.
pub fn pose_cell() -> (PoseWriter, PoseReader) {
    let slot: Slot = Arc::new(RwLock::new(PoseSnapshot::default()));
    (
        PoseWriter {
            slot: Arc::clone(&slot),
        },
        PoseReader { slot },
    )
}

/// Exclusive write end of a pose slot.
#[derive(Debug)]
pub struct PoseWriter {
    slot: Slot,
}

impl PoseWriter {
    /// Overwrite the cached pose.
    pub fn set(&self, pose: Pose2D) {
        // A writer that panicked mid-update left a plain Copy value behind;
        // taking over the guard is always safe here.
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        guard.pose = pose;
        guard.updates = guard.updates.saturating_add(1);
    }

    /// A new reader for this slot.
    pub fn reader(&self) -> PoseReader {
        PoseReader {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// Shared read end of a pose slot.
#[derive(Debug, Clone)]
pub struct PoseReader {
    slot: Slot,
}

impl PoseReader {
    /// Copy the current pose and update count atomically.
    pub fn snapshot(&self) -> PoseSnapshot {
        *self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current pose, identity if none has been written.
    pub fn pose(&self) -> Pose2D {
        self.snapshot().pose
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fresh_cell_holds_identity() {
        let (_writer, reader) = pose_cell();
        let snap = reader.snapshot();
        assert_eq!(snap.pose, Pose2D::identity());
        assert!(snap.is_default());
    }

    #[test]
    fn set_overwrites_previous_pose() {
        let (writer, reader) = pose_cell();
        writer.set(Pose2D::new(1.0, 0.0, 0.0));
        writer.set(Pose2D::new(2.0, 3.0, 1.0));

        let snap = reader.snapshot();
        assert_eq!(snap.pose, Pose2D::new(2.0, 3.0, 1.0));
        assert_eq!(snap.updates, 2);
        assert!(!snap.is_default());
    }

    #[test]
    fn all_readers_share_the_slot() {
        let (writer, reader) = pose_cell();
        let cloned = reader.clone();
        let from_writer = writer.reader();

        writer.set(Pose2D::new(4.0, 5.0, 0.25));
        assert_eq!(reader.pose(), Pose2D::new(4.0, 5.0, 0.25));
        assert_eq!(cloned.pose(), Pose2D::new(4.0, 5.0, 0.25));
        assert_eq!(from_writer.pose(), Pose2D::new(4.0, 5.0, 0.25));
    }

    #[test]
    fn writer_can_move_to_another_thread() {
        let (writer, reader) = pose_cell();
        let handle = thread::spawn(move || {
            for i in 0..100 {
                writer.set(Pose2D::new(f64::from(i), f64::from(i), 0.0));
            }
        });
        handle.join().unwrap();

        let snap = reader.snapshot();
        assert_eq!(snap.updates, 100);
        assert_eq!(snap.pose.x, 99.0);
        // x and y were written together and are read together.
        assert_eq!(snap.pose.x, snap.pose.y);
    }
}
