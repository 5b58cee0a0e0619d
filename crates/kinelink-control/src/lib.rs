//! Kinelink Control - Tick-side consumers of the bridged state
//!
//! Two stateful units driven by the tick loop: the camera rig, a state
//! machine over externally-directed motion modes, and the landmark
//! aggregator, which turns streamed pose samples into smoothed world
//! positions. Neither touches the network; both consume the mailbox
//! snapshot handed to them each tick.

pub mod aggregator;
pub mod camera;

pub use aggregator::*;
pub use camera::*;
