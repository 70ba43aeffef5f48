//! Error types for the operator console.

use thiserror::Error;

/// Errors returned by the relay client.
///
/// On the token path this is the token-fetch error that drives the broadcast
/// panel's backoff.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The relay could not be reached (DNS, connect, timeout)
    #[error("Relay unreachable: {0}")]
    Unreachable(String),

    /// The relay answered with a non-success status
    #[error("Relay rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The relay answered with a body we could not decode
    #[error("Invalid relay response: {0}")]
    InvalidResponse(String),
}

impl RelayError {
    /// HTTP status of a rejection, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            RelayError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors reported by a media transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connecting to the media endpoint failed
    #[error("Transport connect failed: {0}")]
    Connect(String),

    /// The media endpoint sent something we could not understand
    #[error("Transport protocol error: {0}")]
    Protocol(String),

    /// The connection was closed by the remote side
    #[error("Transport closed: {0}")]
    Closed(String),
}

/// Errors of the recording session controller.
///
/// These are surfaced through the panel's dismissible banner and never drive a
/// reconnect.
#[derive(Debug, Error)]
pub enum RecordingError {
    /// An egress id is already held by this panel
    #[error("A recording is already running (egress {0})")]
    AlreadyRecording(String),

    /// `stop` was called without a held egress id
    #[error("No recording is running")]
    NotRecording,

    /// The recording relay rejected the request or was unreachable
    #[error("Recording request failed: {0}")]
    Rejected(#[from] RelayError),
}

/// Errors around the stored admin session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is malformed: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Username must not be empty")]
    EmptyUsername,

    /// Only admin roles may open a console session
    #[error("'{username}' is not an admin")]
    NotAnAdmin { username: String },

    #[error("Permission denied: '{username}' lacks {capability}")]
    PermissionDenied {
        username: String,
        capability: String,
    },
}

/// Errors that end a CLI command
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Recording(#[from] RecordingError),

    /// A room command failed in some of the targeted rooms
    #[error("{command} failed in {failed} of {total} room(s)")]
    PartialFanOut {
        command: String,
        failed: usize,
        total: usize,
    },

    #[error("Terminal error: {0}")]
    Terminal(String),
}
