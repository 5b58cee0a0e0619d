//! Kinelink Core - Fundamental types and primitives
//!
//! This crate defines the types shared across the kinelink bridge:
//! - 3D math primitives (Vec3, Quat)
//! - The fixed landmark index set
//! - Error types
//! - Tick clock for the render cadence

pub mod error;
pub mod landmark;
pub mod math;
pub mod tick;

pub use error::*;
pub use landmark::*;
pub use math::*;
pub use tick::*;
