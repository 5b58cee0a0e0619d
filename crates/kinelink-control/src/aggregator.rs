//! Landmark aggregator: streamed samples to smoothed world positions
//!
//! Samples accumulate per landmark as frames arrive; once the sample
//! threshold is met the average becomes that point's new movement target
//! and the accumulator resets. Rendered positions chase their targets at
//! a capped speed instead of snapping. A one-time calibration offset
//! pins the hip midpoint to the local origin.

use kinelink_core::{Landmark, Vec3, LANDMARK_COUNT};

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Samples accumulated before a target update
    pub samples_per_update: u32,
    /// Producer-space to world-space scale
    pub multiplier: f32,
    /// Cap on per-second landmark travel (world units)
    pub max_speed: f32,
    /// Vertical lift applied to the virtual head anchor
    pub head_height_offset: f32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            samples_per_update: 1,
            multiplier: 10.0,
            max_speed: 50.0,
            head_height_offset: 0.5,
        }
    }
}

/// Per-landmark accumulation, targets and smoothed positions
#[derive(Debug, Clone)]
pub struct LandmarkAggregator {
    config: AggregatorConfig,
    sums: [Vec3; LANDMARK_COUNT],
    sample_count: u32,
    targets: [Vec3; LANDMARK_COUNT],
    positions: [Vec3; LANDMARK_COUNT],
    offset: Vec3,
    calibrated: bool,
}

impl LandmarkAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        LandmarkAggregator {
            config,
            sums: [Vec3::ZERO; LANDMARK_COUNT],
            sample_count: 0,
            targets: [Vec3::ZERO; LANDMARK_COUNT],
            positions: [Vec3::ZERO; LANDMARK_COUNT],
            offset: Vec3::ZERO,
            calibrated: false,
        }
    }

    /// Accumulate one full landmark frame
    pub fn ingest(&mut self, frame: &[Vec3; LANDMARK_COUNT]) {
        for (sum, sample) in self.sums.iter_mut().zip(frame.iter()) {
            *sum += *sample;
        }
        self.sample_count += 1;
    }

    /// Advance targets and positions by one tick
    pub fn tick(&mut self, dt: f32) {
        if self.sample_count >= self.config.samples_per_update {
            let inv = 1.0 / self.sample_count as f32;
            for (target, sum) in self.targets.iter_mut().zip(self.sums.iter_mut()) {
                *target = *sum * inv * self.config.multiplier;
                *sum = Vec3::ZERO;
            }
            self.sample_count = 0;

            if !self.calibrated {
                // Pin the hip midpoint to the local origin; frozen until
                // an explicit recalibration
                let hips = midpoint(
                    self.targets[Landmark::LeftHip.index()],
                    self.targets[Landmark::RightHip.index()],
                );
                self.offset = -hips;
                self.calibrated = true;
                tracing::info!(
                    x = self.offset.x,
                    y = self.offset.y,
                    z = self.offset.z,
                    "landmark calibration captured"
                );
            }
        }

        let max_step = self.config.max_speed * dt;
        for (position, target) in self.positions.iter_mut().zip(self.targets.iter()) {
            *position = position.move_towards(*target + self.offset, max_step);
        }
    }

    /// Forget the calibration; the next target update captures a new one
    pub fn recalibrate(&mut self) {
        self.calibrated = false;
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    pub fn position(&self, landmark: Landmark) -> Vec3 {
        self.positions[landmark.index()]
    }

    pub fn positions(&self) -> &[Vec3; LANDMARK_COUNT] {
        &self.positions
    }

    /// Body center: midpoint of the hips
    pub fn center(&self) -> Vec3 {
        midpoint(
            self.position(Landmark::LeftHip),
            self.position(Landmark::RightHip),
        )
    }

    /// Head anchor: ear midpoint lifted by the configured offset
    pub fn virtual_head_position(&self) -> Vec3 {
        midpoint(
            self.position(Landmark::LeftEar),
            self.position(Landmark::RightEar),
        ) + Vec3::UP * self.config.head_height_offset
    }

    /// Facing direction derived from the shoulder line
    pub fn body_forward(&self) -> Vec3 {
        let across = self.position(Landmark::RightShoulder) - self.position(Landmark::LeftShoulder);
        let forward = across.cross(Vec3::UP).normalized();
        if forward == Vec3::ZERO {
            Vec3::FORWARD
        } else {
            forward
        }
    }
}

impl Default for LandmarkAggregator {
    fn default() -> Self {
        LandmarkAggregator::new(AggregatorConfig::default())
    }
}

fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
    (a + b) * 0.5
}
