//! Message codec for the pose bridge wire protocol
//!
//! Inbound: one JSON object per line from the producer. Every key is
//! optional; a missing key means "no update" for the matching cached
//! field, never zero. Outbound: one feedback object per received
//! message, newline-terminated.

use serde::{Deserialize, Serialize};

use kinelink_core::{KinelinkError, KinelinkResult, Vec3, LANDMARK_COUNT};

/// Number of per-key movement speed scalars
pub const KEY_SPEED_COUNT: usize = 6;

/// Decoded inbound record
///
/// Fields are `Option`: absent keys decode to `None` and must leave the
/// receiver's cached state untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoseMessage {
    #[serde(rename = "frameNum")]
    pub frame_num: Option<i64>,

    #[serde(rename = "section")]
    pub section: Option<i64>,

    /// Exactly 23 `[x, y, z]` points when present
    pub landmarks: Option<Vec<[f32; 3]>>,

    pub param: Option<f32>,

    #[serde(rename = "_NoiseIntensity")]
    pub noise_intensity: Option<f32>,

    #[serde(rename = "_NoiseSpeed")]
    pub noise_speed: Option<f32>,

    #[serde(rename = "cameratransform")]
    pub camera_transform: Option<[f32; 3]>,

    /// 0 = keybind, 1 = follow, 2 = vector move
    #[serde(rename = "cameraMode")]
    pub camera_mode: Option<i32>,

    /// Exactly 6 scalars when present: w, a, s, d, q, e
    #[serde(rename = "cameraKeySpeeds")]
    pub camera_key_speeds: Option<Vec<f32>>,

    #[serde(rename = "cameraMoveSpeedFactor")]
    pub camera_move_speed_factor: Option<f32>,

    /// Variable-length feature vector, semantics external
    pub features: Option<Vec<f32>>,
}

impl PoseMessage {
    /// Parse one line into a message
    ///
    /// Malformed JSON or wrong-sized arrays reject the whole message; the
    /// caller drops it and keeps the connection open.
    pub fn decode(line: &str) -> KinelinkResult<Self> {
        let message: PoseMessage =
            serde_json::from_str(line).map_err(|e| KinelinkError::Decode(e.to_string()))?;
        message.validate()?;
        Ok(message)
    }

    fn validate(&self) -> KinelinkResult<()> {
        if let Some(landmarks) = &self.landmarks {
            if landmarks.len() != LANDMARK_COUNT {
                return Err(KinelinkError::LandmarkCount(landmarks.len()));
            }
        }
        if let Some(speeds) = &self.camera_key_speeds {
            if speeds.len() != KEY_SPEED_COUNT {
                return Err(KinelinkError::KeySpeedCount(speeds.len()));
            }
        }
        Ok(())
    }

    /// Landmarks as a fixed-size point array, when present and well-sized
    pub fn landmark_points(&self) -> Option<[Vec3; LANDMARK_COUNT]> {
        let landmarks = self.landmarks.as_ref()?;
        if landmarks.len() != LANDMARK_COUNT {
            return None;
        }
        let mut points = [Vec3::ZERO; LANDMARK_COUNT];
        for (point, raw) in points.iter_mut().zip(landmarks.iter()) {
            *point = Vec3::from_array(*raw);
        }
        Some(points)
    }
}

/// Outbound feedback record, one per received inbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    #[serde(rename = "frameNum")]
    pub frame_num: i64,

    #[serde(rename = "cameraPosition")]
    pub camera_position: [f32; 3],

    #[serde(rename = "targetPosition")]
    pub target_position: [f32; 3],

    /// Camera position minus target position
    #[serde(rename = "cameraToTargetRelativePosition")]
    pub camera_to_target_relative_position: [f32; 3],

    #[serde(rename = "cameraMode")]
    pub camera_mode: i32,

    pub message: String,
}

impl FeedbackMessage {
    pub fn new(
        frame_num: i64,
        camera_position: Vec3,
        target_position: Vec3,
        camera_mode: i32,
        message: impl Into<String>,
    ) -> Self {
        let relative = camera_position - target_position;
        FeedbackMessage {
            frame_num,
            camera_position: camera_position.to_array(),
            target_position: target_position.to_array(),
            camera_to_target_relative_position: relative.to_array(),
            camera_mode,
            message: message.into(),
        }
    }

    /// Serialize to one newline-terminated line
    pub fn encode_line(&self) -> KinelinkResult<String> {
        let mut line =
            serde_json::to_string(self).map_err(|e| KinelinkError::Encode(e.to_string()))?;
        line.push('\n');
        Ok(line)
    }
}
