//! Switchboard loopback relay.
//!
//! Stands in for the token service, the recording egress API and the media
//! server's signalling so the console can be run and tested end to end.

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
