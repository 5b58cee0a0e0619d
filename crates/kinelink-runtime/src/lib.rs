//! Kinelink Runtime - The bridge put together
//!
//! Owns the server, the tick loop and the tick-side state. Network tasks
//! and the tick loop only meet through the mailbox, the feedback cell
//! and the client registry.

pub mod bridge;

pub use bridge::*;
