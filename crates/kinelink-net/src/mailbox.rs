//! Latest-state mailbox bridging handler tasks and the tick loop
//!
//! Single slot, overwrite on write. An overwrite of state that was never
//! read is lost on purpose: the consumer wants the newest camera target,
//! not a queue. That makes the mailbox unsuitable for one-shot events;
//! the producer's next message is the only retry.

use parking_lot::Mutex;

use kinelink_core::{Vec3, LANDMARK_COUNT};
use kinelink_wire::{PoseMessage, KEY_SPEED_COUNT};

/// Value snapshot of the cached producer state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    pub frame_num: i64,
    pub section: i64,
    pub param: f32,
    pub noise_intensity: f32,
    pub noise_speed: f32,
    /// Destination for vector moves (`cameratransform`)
    pub camera_target: Vec3,
    /// Raw mode enumerator; interpreted by the control state machine
    pub camera_mode: i32,
    pub key_speeds: [f32; KEY_SPEED_COUNT],
    pub move_speed_factor: f32,
    pub features: Vec<f32>,
    /// Landmark frame not yet consumed by the tick loop, if any.
    /// Unlike the scalar fields this slot is taken (not retained) on
    /// read, so one frame feeds the aggregator at most once.
    pub landmarks: Option<[Vec3; LANDMARK_COUNT]>,
}

#[derive(Debug, Default)]
struct Inner {
    state: StateSnapshot,
    dirty: bool,
}

/// Single-slot overwrite cache with a dirty flag
///
/// Many handler tasks may write concurrently (serialized by the lock);
/// exactly one consumer reads. Fields absent from a message retain their
/// previous cached value.
#[derive(Debug, Default)]
pub struct Mailbox {
    inner: Mutex<Inner>,
}

impl Mailbox {
    pub fn new() -> Self {
        Mailbox::default()
    }

    /// Seed the cache, e.g. with configured initial noise values, so the
    /// first partial message does not zero the untouched fields
    pub fn with_initial(state: StateSnapshot) -> Self {
        Mailbox {
            inner: Mutex::new(Inner {
                state,
                dirty: false,
            }),
        }
    }

    /// Overwrite every cached field present in `message`, then mark dirty
    pub fn write(&self, message: &PoseMessage) {
        let mut inner = self.inner.lock();

        if let Some(v) = message.frame_num {
            inner.state.frame_num = v;
        }
        if let Some(v) = message.section {
            inner.state.section = v;
        }
        if let Some(v) = message.param {
            inner.state.param = v;
        }
        if let Some(v) = message.noise_intensity {
            inner.state.noise_intensity = v;
        }
        if let Some(v) = message.noise_speed {
            inner.state.noise_speed = v;
        }
        if let Some(v) = message.camera_transform {
            inner.state.camera_target = Vec3::from_array(v);
        }
        if let Some(v) = message.camera_mode {
            inner.state.camera_mode = v;
        }
        if let Some(speeds) = &message.camera_key_speeds {
            if speeds.len() == KEY_SPEED_COUNT {
                inner.state.key_speeds.copy_from_slice(speeds);
            }
        }
        if let Some(v) = message.camera_move_speed_factor {
            inner.state.move_speed_factor = v;
        }
        if let Some(features) = &message.features {
            inner.state.features = features.clone();
        }
        if let Some(points) = message.landmark_points() {
            inner.state.landmarks = Some(points);
        }

        inner.dirty = true;
    }

    /// Take a snapshot when unread data is present, clearing the flag
    ///
    /// All fields are copied out under the same critical section they
    /// were written in, so the consumer never sees a torn update.
    pub fn take_if_dirty(&self) -> Option<StateSnapshot> {
        let mut inner = self.inner.lock();
        if !inner.dirty {
            return None;
        }
        inner.dirty = false;
        let snapshot = inner.state.clone();
        inner.state.landmarks = None;
        Some(snapshot)
    }
}
