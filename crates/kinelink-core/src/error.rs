//! Error types for the kinelink bridge

use thiserror::Error;

/// Core kinelink errors
#[derive(Error, Debug)]
pub enum KinelinkError {
    // Wire errors
    #[error("Invalid message: {0}")]
    Decode(String),

    #[error("Failed to encode message: {0}")]
    Encode(String),

    #[error("Landmark list must have 23 points, got {0}")]
    LandmarkCount(usize),

    #[error("Key speed array must have 6 entries, got {0}")]
    KeySpeedCount(usize),

    // Transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Bind failed: {0}")]
    BindFailed(String),
}

/// Result type for kinelink operations
pub type KinelinkResult<T> = Result<T, KinelinkError>;
