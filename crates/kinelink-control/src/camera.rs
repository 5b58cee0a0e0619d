//! Camera rig state machine
//!
//! One explicit state per rig: manual input, or exactly one
//! externally-directed mode. Entering any external mode disables manual
//! input until the rig is explicitly returned to manual; the two control
//! sources are never blended.
//!
//! Mode selection happens on dirty ticks from the mailbox enumerator
//! (0 keybind, 1 follow, 2 vector move). Motion for the continuous modes
//! advances every tick in [`CameraRig::update`]; key-driven motion is
//! applied once per directive.

use kinelink_core::{clamp01, Quat, Vec3};

/// Tunable rig parameters; angles in degrees, speeds per second
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Orbit rate for key-driven and manual rotation
    pub rotation_speed: f32,
    /// Dolly rate for key-driven and manual zoom
    pub zoom_speed: f32,
    /// Exponential rate for the look-at re-orientation post-step
    pub look_lerp_speed: f32,
    /// Zoom-in stops at this distance from the pivot
    pub min_zoom_distance: f32,
    pub min_vertical_angle: f32,
    pub max_vertical_angle: f32,
    /// Outer screen-edge band that engages follow mode
    pub follow_margin: f32,
    /// Extra band inside `follow_margin` that must be re-entered before
    /// follow disengages; the gap is the hysteresis
    pub stop_margin: f32,
    /// Follow keeps the camera this far behind the target
    pub follow_distance: f32,
    /// And this far above it
    pub height_offset: f32,
    /// Base rate scaled by the vector-move speed factor
    pub vector_base_speed: f32,
    /// Remaining distance below which a vector move snaps and exits
    pub arrival_epsilon: f32,
    /// Vertical field of view of the pinhole viewport model
    pub fov_degrees: f32,
    pub aspect: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            rotation_speed: 50.0,
            zoom_speed: 5.0,
            look_lerp_speed: 5.0,
            min_zoom_distance: 2.0,
            min_vertical_angle: -10.0,
            max_vertical_angle: 80.0,
            follow_margin: 0.2,
            stop_margin: 0.1,
            follow_distance: 10.0,
            height_offset: 3.0,
            vector_base_speed: 50.0,
            arrival_epsilon: 0.01,
            fov_degrees: 60.0,
            aspect: 16.0 / 9.0,
        }
    }
}

/// What the rig is tracking: a world position and the way it faces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedTarget {
    pub position: Vec3,
    pub forward: Vec3,
}

/// Externally-directed motion mode, exactly one active
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExternalMode {
    /// External control engaged but no motion directive
    Idle,
    KeyBind,
    Follow {
        engaged: bool,
    },
    VectorMove {
        destination: Vec3,
        speed_factor: f32,
    },
}

/// Who drives the rig
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlState {
    Manual,
    External(ExternalMode),
}

/// One decoded camera directive, built from a mailbox snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraDirective {
    pub mode: i32,
    pub destination: Vec3,
    pub speed_factor: f32,
    /// w, a, s, d, q, e
    pub key_speeds: [f32; 6],
}

/// Camera position, orientation and control state
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub position: Vec3,
    pub rotation: Quat,
    state: ControlState,
    config: CameraConfig,
}

impl CameraRig {
    pub fn new(config: CameraConfig) -> Self {
        let position = Vec3::new(0.0, config.height_offset, -config.follow_distance);
        CameraRig {
            position,
            rotation: Quat::IDENTITY,
            state: ControlState::Manual,
            config,
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Wire enumerator for the current mode; -1 when no external motion
    /// mode is active
    pub fn mode_code(&self) -> i32 {
        match self.state {
            ControlState::External(ExternalMode::KeyBind) => 0,
            ControlState::External(ExternalMode::Follow { .. }) => 1,
            ControlState::External(ExternalMode::VectorMove { .. }) => 2,
            ControlState::Manual | ControlState::External(ExternalMode::Idle) => -1,
        }
    }

    /// Hand the rig back to manual input
    pub fn set_manual(&mut self) {
        self.state = ControlState::Manual;
    }

    /// Apply a directive from the producer, switching mode
    ///
    /// Key-driven motion is applied here, once per directive, scaled by
    /// the elapsed tick time. Follow and vector moves only record their
    /// parameters; their motion advances in [`CameraRig::update`].
    pub fn ingest(&mut self, directive: &CameraDirective, target: Option<&TrackedTarget>, dt: f32) {
        match directive.mode {
            0 => {
                self.state = ControlState::External(ExternalMode::KeyBind);
                let pivot = target.map(|t| t.position).unwrap_or(Vec3::ZERO);
                self.apply_orbit(directive.key_speeds, pivot, dt);
            }
            1 => {
                // Re-selecting follow keeps the engaged flag; otherwise
                // every directive would reset the hysteresis
                let engaged = match self.state {
                    ControlState::External(ExternalMode::Follow { engaged }) => engaged,
                    _ => false,
                };
                self.state = ControlState::External(ExternalMode::Follow { engaged });
            }
            2 => {
                self.state = ControlState::External(ExternalMode::VectorMove {
                    destination: directive.destination,
                    speed_factor: directive.speed_factor,
                });
            }
            other => {
                tracing::warn!(mode = other, "unrecognized camera mode, disabling motion");
                self.state = ControlState::External(ExternalMode::Idle);
            }
        }
    }

    /// Advance the active mode by one tick
    pub fn update(&mut self, target: Option<&TrackedTarget>, dt: f32) {
        match self.state {
            ControlState::External(ExternalMode::Follow { engaged }) => {
                if let Some(target) = target {
                    let engaged = self.follow_step(target, engaged, dt);
                    self.state = ControlState::External(ExternalMode::Follow { engaged });
                }
            }
            ControlState::External(ExternalMode::VectorMove {
                destination,
                speed_factor,
            }) => {
                let weight = clamp01(speed_factor * self.config.vector_base_speed * dt);
                self.position = self.position.lerp(destination, weight);
                if self.position.distance(destination) < self.config.arrival_epsilon {
                    // Snap and exit; no motion until the next directive
                    self.position = destination;
                    self.state = ControlState::External(ExternalMode::Idle);
                }
            }
            _ => {}
        }

        self.normalize_orientation(target, dt);
    }

    /// Manual orbit/zoom input; ignored while external control is engaged
    ///
    /// Returns whether the input was applied.
    pub fn manual_input(&mut self, speeds: [f32; 6], pivot: Vec3, dt: f32) -> bool {
        if self.state != ControlState::Manual {
            return false;
        }
        self.apply_orbit(speeds, pivot, dt);
        true
    }

    /// Orbit and dolly around `pivot` from six speed scalars (w a s d q e)
    ///
    /// w/s dolly toward and away from the pivot, a/d orbit horizontally,
    /// q/e orbit vertically. Each scalar independently gates its axis;
    /// zero or negative means no motion on that axis this tick. Dolly-in
    /// is gated by the minimum distance, dolly-out is free.
    fn apply_orbit(&mut self, speeds: [f32; 6], pivot: Vec3, dt: f32) {
        let [w, a, s, d, q, e] = speeds.map(|v| v.max(0.0));
        let rate = self.config.rotation_speed.to_radians() * dt;

        let to_pivot = pivot - self.position;
        let dir = to_pivot.normalized();
        if w > 0.0 && to_pivot.length() > self.config.min_zoom_distance {
            self.position += dir * (self.config.zoom_speed * w * dt);
        }
        if s > 0.0 {
            self.position += dir * -(self.config.zoom_speed * s * dt);
        }

        let horizontal = (d - a) * rate;
        if horizontal != 0.0 {
            self.rotate_around(pivot, Vec3::UP, horizontal);
        }

        let vertical = (e - q) * rate;
        if vertical != 0.0 {
            self.rotate_around(pivot, self.rotation.right(), vertical);
        }
    }

    /// Orbit the rig about `axis` through `pivot` by `angle` radians
    pub fn rotate_around(&mut self, pivot: Vec3, axis: Vec3, angle: f32) {
        let q = Quat::from_axis_angle(axis, angle);
        self.position = pivot + q.rotate(self.position - pivot);
        self.rotation = q * self.rotation;
    }

    /// Project a world point into [0,1]^2 viewport coordinates
    ///
    /// `None` when the point is on or behind the camera plane.
    pub fn viewport_point(&self, world: Vec3) -> Option<(f32, f32)> {
        let local = self.rotation.inverse().rotate(world - self.position);
        if local.z <= 0.0 {
            return None;
        }
        let tan_half = (self.config.fov_degrees * 0.5).to_radians().tan();
        let vx = 0.5 + local.x / (2.0 * local.z * tan_half * self.config.aspect);
        let vy = 0.5 + local.y / (2.0 * local.z * tan_half);
        Some((vx, vy))
    }

    /// One follow tick: hysteresis decision, then exponential approach
    fn follow_step(&mut self, target: &TrackedTarget, was_engaged: bool, dt: f32) -> bool {
        let engaged = match self.viewport_point(target.position) {
            // Behind the camera plane always engages
            None => true,
            Some((vx, vy)) => {
                let outer = self.config.follow_margin;
                let inner = outer + self.config.stop_margin;
                let outside_outer =
                    vx <= outer || vx >= 1.0 - outer || vy <= outer || vy >= 1.0 - outer;
                let inside_inner =
                    vx > inner && vx < 1.0 - inner && vy > inner && vy < 1.0 - inner;
                if was_engaged {
                    // Disengage only once the target is back inside the
                    // strictly smaller inner band
                    !inside_inner
                } else {
                    outside_outer
                }
            }
        };

        if engaged {
            let desired = target.position - target.forward * self.config.follow_distance
                + Vec3::UP * self.config.height_offset;
            let weight = clamp01(self.config.look_lerp_speed * dt);
            self.position = self.position.lerp(desired, weight);
        }
        engaged
    }

    /// Shared post-step: clamp the vertical look angle, then ease the
    /// orientation toward the tracked target
    ///
    /// Runs after every tick regardless of which mode produced motion.
    fn normalize_orientation(&mut self, target: Option<&TrackedTarget>, dt: f32) {
        let f = self.rotation.forward();
        if f != Vec3::ZERO {
            let pitch = (-f.y).asin();
            let clamped = pitch.clamp(
                self.config.min_vertical_angle.to_radians(),
                self.config.max_vertical_angle.to_radians(),
            );
            if clamped != pitch {
                let yaw = f.x.atan2(f.z);
                self.rotation = Quat::from_yaw_pitch(yaw, clamped);
            }
        }

        if let Some(target) = target {
            let look = target.position - self.position;
            if look != Vec3::ZERO {
                let desired = Quat::look_rotation(look, Vec3::UP);
                let weight = clamp01(self.config.look_lerp_speed * dt);
                self.rotation = self.rotation.slerp(desired, weight);
            }
        }
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        CameraRig::new(CameraConfig::default())
    }
}
