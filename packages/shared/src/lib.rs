//! Shared library for the Switchboard console and the loopback relay.
//!
//! - `logger`: tracing subscriber setup used by every binary
//! - `time`: clock abstraction and timestamp formatting
//! - `protocol`: wire types for the relay HTTP API and the signalling WebSocket

pub mod logger;
pub mod protocol;
pub mod time;
