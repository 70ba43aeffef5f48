//! Switchboard operator console.
//!
//! Building blocks for an admin view over live voice rooms: a resilient
//! broadcast panel with recording control, passive per-room speaker monitors
//! merged into one speaking set, and room moderation through the relay.

pub mod admin;
pub mod broadcast;
pub mod cli;
pub mod error;
pub mod media;
pub mod reconcile;
pub mod relay;
pub mod retry;
pub mod speakers;
