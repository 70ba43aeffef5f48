//! Recording session controller.
//!
//! Tracks the egress started from one broadcast panel. Failures are returned
//! to the caller and also kept in a dismissible banner for the operator view.

use std::sync::Arc;

use crate::{error::RecordingError, relay::RelayApi};

/// Egress held by a panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSession {
    pub egress_id: Option<String>,
}

impl RecordingSession {
    pub fn is_recording(&self) -> bool {
        self.egress_id.is_some()
    }
}

pub struct RecordingController {
    relay: Arc<dyn RelayApi>,
    session: RecordingSession,
    banner: Option<String>,
}

impl RecordingController {
    pub fn new(relay: Arc<dyn RelayApi>) -> Self {
        Self {
            relay,
            session: RecordingSession::default(),
            banner: None,
        }
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_recording()
    }

    /// Current error banner, if any
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    /// Start recording `room_name` on behalf of `initiator`
    pub async fn start(
        &mut self,
        room_name: &str,
        initiator: &str,
    ) -> Result<String, RecordingError> {
        if let Some(egress_id) = &self.session.egress_id {
            return Err(self.surface(RecordingError::AlreadyRecording(egress_id.clone())));
        }

        match self
            .relay
            .start_recording(room_name.to_string(), initiator.to_string())
            .await
        {
            Ok(egress_id) => {
                tracing::info!(
                    "Recording of '{}' started by '{}' (egress {})",
                    room_name,
                    initiator,
                    egress_id
                );
                self.session.egress_id = Some(egress_id.clone());
                self.banner = None;
                Ok(egress_id)
            }
            Err(e) => Err(self.surface(RecordingError::from(e))),
        }
    }

    /// Stop the held recording. Fails without any network call when nothing is held.
    pub async fn stop(&mut self) -> Result<(), RecordingError> {
        let Some(egress_id) = self.session.egress_id.clone() else {
            return Err(self.surface(RecordingError::NotRecording));
        };

        match self.relay.stop_recording(egress_id.clone()).await {
            Ok(()) => {
                tracing::info!("Recording stopped (egress {})", egress_id);
                self.session.egress_id = None;
                self.banner = None;
                Ok(())
            }
            Err(e) => Err(self.surface(RecordingError::from(e))),
        }
    }

    /// Panel is closing: best-effort stop, then forget the egress either way
    pub async fn release(&mut self) {
        if self.session.is_recording()
            && let Err(e) = self.stop().await
        {
            tracing::warn!("Recording could not be stopped on close: {}", e);
        }
        self.session.egress_id = None;
    }

    fn surface(&mut self, error: RecordingError) -> RecordingError {
        tracing::warn!("{}", error);
        self.banner = Some(error.to_string());
        error
    }
}
