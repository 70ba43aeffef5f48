//! Client side of the backend relay.
//!
//! The relay issues session tokens, starts/stops recordings and forwards room
//! commands to the media service. [`RelayApi`] is the seam every component of
//! the console depends on; [`HttpRelayClient`] is the production implementation.

mod command;
mod http;

pub use command::{CommandKind, FanOutReport, RoomCommand, fan_out};
pub use http::HttpRelayClient;

use async_trait::async_trait;
use switchboard_shared::protocol::{RecordingSnapshot, RoomSnapshot, TokenRequest};

use crate::error::RelayError;

/// Relay operations used by the console
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RelayApi: Send + Sync {
    /// Request a session token (`POST /token`)
    async fn fetch_token(&self, request: TokenRequest) -> Result<String, RelayError>;

    /// Start recording a room (`POST /start-session-recording`), returning the egress id
    async fn start_recording(&self, room_name: String, initiator: String)
    -> Result<String, RelayError>;

    /// Stop a running recording (`POST /stop-session-recording`)
    async fn stop_recording(&self, egress_id: String) -> Result<(), RelayError>;

    /// Send a mute/unmute/logout command to one room
    async fn send_room_command(&self, command: RoomCommand) -> Result<(), RelayError>;

    /// List the active rooms (`GET /api/rooms`)
    async fn list_rooms(&self) -> Result<Vec<RoomSnapshot>, RelayError>;

    /// Recording history, newest first (`GET /api/recordings`)
    async fn list_recordings(&self) -> Result<Vec<RecordingSnapshot>, RelayError>;
}
