//! Kinelink Net - The network side of the bridge
//!
//! One accept loop, one handler task per connection, and two single-slot
//! cells crossing the thread boundary:
//! - the [`Mailbox`] carries the latest decoded producer state toward the
//!   tick loop;
//! - the [`FeedbackCell`] carries the latest camera/target snapshot back
//!   toward connection handlers composing replies.
//!
//! The mailbox, the feedback cell and the client registry are the only
//! cross-thread mutable state; each is guarded by its own lock, never
//! nested, never held across network I/O.

pub mod feedback;
pub mod mailbox;
pub mod registry;
pub mod server;

pub use feedback::*;
pub use mailbox::*;
pub use registry::*;
pub use server::*;
