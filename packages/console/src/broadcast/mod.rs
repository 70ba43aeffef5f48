//! The operator's broadcast panel: connection state machine plus recording control.

mod attempt;
mod panel;
mod recording;

pub use attempt::{ConnectionAttempt, ConnectionState, MAX_AUTOMATIC_ATTEMPTS, Step};
pub use panel::{BroadcastPanel, ConnectionListener, PanelConfig};
pub use recording::{RecordingController, RecordingSession};
