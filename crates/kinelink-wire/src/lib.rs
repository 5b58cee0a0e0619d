//! Kinelink Wire - Line framing and message codec
//!
//! The producer speaks newline-delimited UTF-8 JSON over TCP: one object
//! per line, no length prefix. This crate turns raw byte chunks into
//! discrete messages and (de)serializes them.

pub mod framing;
pub mod message;

pub use framing::*;
pub use message::*;
