//! Who is speaking, across every room.
//!
//! A [`MonitorPool`] keeps one listen-only [`RoomSpeakerMonitor`] per room and
//! merges their reports in a [`SpeakerAggregator`].

mod aggregator;
mod monitor;
mod pool;

pub use aggregator::{RoomSpeakerHandle, SpeakerAggregator, SpeakingSet};
pub use monitor::{RoomSpeakerMonitor, monitor_identity};
pub use pool::MonitorPool;
