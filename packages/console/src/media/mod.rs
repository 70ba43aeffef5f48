//! Media transport boundary.
//!
//! The console never touches audio itself. A [`MediaTransport`] turns a session
//! token into a [`MediaSession`]: a handle that reports transport and
//! active-speaker events and accepts a few controls. The transport owns its
//! reconnection; callers only observe `Connected` / `Disconnected`.

mod signal;

#[cfg(test)]
pub(crate) mod fake;

pub use signal::{SignalTransport, TOKEN_REJECTED};

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};

const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Parameters for joining a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    /// Media endpoint, e.g. `ws://127.0.0.1:4000/rtc`
    pub server_url: String,
    pub token: String,
    pub identity: String,
    pub room_name: String,
    /// Initial microphone state; listen-only sessions keep it off
    pub microphone_enabled: bool,
}

/// Notifications emitted by a media session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// The transport is (re)connected
    Connected,
    /// The transport dropped; it is retrying on its own
    Disconnected { reason: String },
    /// Identities of the room's current active speakers
    ActiveSpeakersChanged(Vec<String>),
    /// The remote side changed our microphone state
    MicrophoneChanged(bool),
    /// We were removed from the room; the session is over
    Removed { reason: String },
}

/// Controls accepted by a media session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaControl {
    Microphone(bool),
    Speaking(bool),
    Leave,
}

/// Handle to one joined room.
///
/// Dropping the handle aborts the session task.
#[derive(Debug)]
pub struct MediaSession {
    events: mpsc::UnboundedReceiver<MediaEvent>,
    controls: mpsc::UnboundedSender<MediaControl>,
    task: Option<JoinHandle<()>>,
}

impl MediaSession {
    /// Wrap the channels and driver task of a running session
    pub fn new(
        events: mpsc::UnboundedReceiver<MediaEvent>,
        controls: mpsc::UnboundedSender<MediaControl>,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            events,
            controls,
            task,
        }
    }

    /// Next event, or `None` once the session task has ended
    pub async fn next_event(&mut self) -> Option<MediaEvent> {
        self.events.recv().await
    }

    pub fn set_microphone(&self, enabled: bool) {
        self.send(MediaControl::Microphone(enabled));
    }

    pub fn set_speaking(&self, active: bool) {
        self.send(MediaControl::Speaking(active));
    }

    /// Leave the room, giving the task a short grace period to say goodbye
    pub async fn close(mut self) {
        self.send(MediaControl::Leave);
        if let Some(mut task) = self.task.take()
            && tokio::time::timeout(CLOSE_GRACE, &mut task).await.is_err()
        {
            task.abort();
        }
    }

    fn send(&self, control: MediaControl) {
        if self.controls.send(control).is_err() {
            tracing::debug!("Media session already ended, control dropped");
        }
    }
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Something that can join rooms
pub trait MediaTransport: Send + Sync {
    /// Start a session; connection happens in the background
    fn join(&self, request: JoinRequest) -> MediaSession;
}
