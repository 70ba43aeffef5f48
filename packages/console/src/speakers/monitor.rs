//! Passive per-room speaker monitor.
//!
//! Joins a room listen-only under a synthetic identity and mirrors the room's
//! active speakers into its [`RoomSpeakerHandle`]. Failures stay local: the
//! room's entry is simply absent.

use std::sync::Arc;

use switchboard_shared::protocol::TokenRequest;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    media::{JoinRequest, MediaEvent, MediaTransport},
    relay::RelayApi,
};

use super::aggregator::RoomSpeakerHandle;

/// Identity used by a monitor: `admin-monitor-<slug>-<suffix>`.
///
/// The random suffix keeps monitors from colliding with real participants
/// and with monitors of earlier runs.
pub fn monitor_identity(room_name: &str) -> String {
    let slug = room_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("admin-monitor-{}-{}", slug, &suffix[..8])
}

pub struct RoomSpeakerMonitor {
    identity: String,
    speakers: Arc<RoomSpeakerHandle>,
    task: Option<JoinHandle<()>>,
}

impl RoomSpeakerMonitor {
    /// Start monitoring the room `speakers` writes to
    pub fn spawn(
        speakers: RoomSpeakerHandle,
        relay: Arc<dyn RelayApi>,
        transport: Arc<dyn MediaTransport>,
        server_url: String,
    ) -> Self {
        let identity = monitor_identity(speakers.room_name());
        let speakers = Arc::new(speakers);
        let task = tokio::spawn(watch_room(
            identity.clone(),
            speakers.clone(),
            relay,
            transport,
            server_url,
        ));

        Self {
            identity,
            speakers,
            task: Some(task),
        }
    }

    pub fn room_name(&self) -> &str {
        self.speakers.room_name()
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The watch ended on its own (token refused, removed, session over)
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Stop listening, close the session, then drop the room's entry
    pub async fn close(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Joining the aborted task guarantees the session has been dropped
            let _ = task.await;
        }
        self.speakers.clear();
        tracing::info!("Stopped monitoring room '{}'", self.speakers.room_name());
    }
}

impl Drop for RoomSpeakerMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.speakers.clear();
        }
    }
}

async fn watch_room(
    identity: String,
    speakers: Arc<RoomSpeakerHandle>,
    relay: Arc<dyn RelayApi>,
    transport: Arc<dyn MediaTransport>,
    server_url: String,
) {
    let room_name = speakers.room_name().to_string();

    let token = match relay
        .fetch_token(TokenRequest::listener(identity.as_str(), room_name.as_str()))
        .await
    {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!("Failed to get monitor token for room '{}': {}", room_name, e);
            return;
        }
    };

    let mut session = transport.join(JoinRequest {
        server_url,
        token,
        identity: identity.clone(),
        room_name: room_name.clone(),
        microphone_enabled: false,
    });
    tracing::info!("Monitoring room '{}' as '{}'", room_name, identity);

    while let Some(event) = session.next_event().await {
        match event {
            MediaEvent::ActiveSpeakersChanged(identities) => {
                tracing::debug!("Room '{}' speakers: {:?}", room_name, identities);
                speakers.replace(identities);
            }
            MediaEvent::Disconnected { reason } => {
                tracing::warn!("Monitor for room '{}' disconnected: {}", room_name, reason);
                speakers.clear();
            }
            MediaEvent::Removed { reason } => {
                tracing::warn!("Monitor for room '{}' removed: {}", room_name, reason);
                break;
            }
            MediaEvent::Connected | MediaEvent::MicrophoneChanged(_) => {}
        }
    }

    speakers.clear();
    session.close().await;
}
