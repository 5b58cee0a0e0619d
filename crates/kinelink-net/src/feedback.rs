//! Feedback cell: the reply-path counterpart of the mailbox
//!
//! The tick loop publishes one snapshot per tick; handler tasks read it
//! when composing per-message replies. No dirty flag: replies always use
//! the freshest published value.

use parking_lot::Mutex;

use kinelink_core::Vec3;

/// Camera/target state published by the tick loop
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeedbackSnapshot {
    pub frame_num: i64,
    pub camera_position: Vec3,
    pub target_position: Vec3,
    pub camera_mode: i32,
}

/// Single-slot cell, written by the tick loop, read by handler tasks
#[derive(Debug, Default)]
pub struct FeedbackCell {
    inner: Mutex<FeedbackSnapshot>,
}

impl FeedbackCell {
    pub fn new() -> Self {
        FeedbackCell::default()
    }

    pub fn publish(&self, snapshot: FeedbackSnapshot) {
        *self.inner.lock() = snapshot;
    }

    pub fn load(&self) -> FeedbackSnapshot {
        *self.inner.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_overwrites() {
        let cell = FeedbackCell::new();
        assert_eq!(cell.load(), FeedbackSnapshot::default());

        let snapshot = FeedbackSnapshot {
            frame_num: 3,
            camera_position: Vec3::new(1.0, 2.0, 3.0),
            target_position: Vec3::new(0.0, 1.0, 0.0),
            camera_mode: 1,
        };
        cell.publish(snapshot);
        assert_eq!(cell.load(), snapshot);
    }
}
