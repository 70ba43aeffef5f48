//! In-process transport for unit tests.
//!
//! Every joined session is recorded; tests push events into it and inspect
//! the controls it received.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::{JoinRequest, MediaControl, MediaEvent, MediaSession, MediaTransport};

/// Test-side view of one joined session
pub(crate) struct FakeSessionHandle {
    pub request: JoinRequest,
    pub events: mpsc::UnboundedSender<MediaEvent>,
    pub controls: mpsc::UnboundedReceiver<MediaControl>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeTransport {
    sessions: Arc<Mutex<Vec<FakeSessionHandle>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Remove and return the oldest joined session
    pub fn take_session(&self) -> Option<FakeSessionHandle> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.is_empty() {
            None
        } else {
            Some(sessions.remove(0))
        }
    }

    /// Remove and return the session joined for `room_name`
    pub fn take_session_for(&self, room_name: &str) -> Option<FakeSessionHandle> {
        let mut sessions = self.sessions.lock().unwrap();
        let index = sessions
            .iter()
            .position(|s| s.request.room_name == room_name)?;
        Some(sessions.remove(index))
    }
}

impl MediaTransport for FakeTransport {
    fn join(&self, request: JoinRequest) -> MediaSession {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (controls_tx, controls_rx) = mpsc::unbounded_channel();
        self.sessions.lock().unwrap().push(FakeSessionHandle {
            request,
            events: events_tx,
            controls: controls_rx,
        });
        MediaSession::new(events_rx, controls_tx, None)
    }
}
