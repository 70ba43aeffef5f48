//! Broadcast panel: the operator's own audio session in one room.
//!
//! A panel owns one driver task. The task fetches a token, joins the room and
//! follows the transport; on token failures it backs off per [`RetryPolicy`]
//! and gives up after [`MAX_AUTOMATIC_ATTEMPTS`], waiting for a manual retry.
//! Attempts never overlap: each one is awaited before the next is scheduled.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use switchboard_shared::protocol::TokenRequest;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{
    error::RecordingError,
    media::{JoinRequest, MediaEvent, MediaSession, MediaTransport},
    relay::RelayApi,
    retry::RetryPolicy,
};

use super::{
    attempt::{ConnectionAttempt, MAX_AUTOMATIC_ATTEMPTS, Step},
    recording::RecordingController,
};

/// Receives every state change of a panel
pub trait ConnectionListener: Send + Sync {
    fn on_transition(&self, attempt: &ConnectionAttempt);
}

impl ConnectionListener for watch::Sender<ConnectionAttempt> {
    fn on_transition(&self, attempt: &ConnectionAttempt) {
        self.send_replace(*attempt);
    }
}

/// Static configuration of a panel
#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub identity: String,
    pub room_name: String,
    /// Media endpoint handed to the transport
    pub server_url: String,
    pub policy: RetryPolicy,
}

enum PanelCommand {
    Retry,
    Microphone(bool),
    Speaking(bool),
}

/// Delivers transitions until the panel is closed.
///
/// The flag and the listener call share one lock, so once `close` returns no
/// listener call can still be in progress or start later.
struct Publisher {
    open: Mutex<bool>,
    listener: Arc<dyn ConnectionListener>,
}

impl Publisher {
    fn publish(&self, attempt: &ConnectionAttempt) {
        let open = self.open.lock().unwrap_or_else(|e| e.into_inner());
        if !*open {
            return;
        }
        tracing::info!(
            "Broadcast state: {} (attempt {}, next in {:?})",
            attempt.state,
            attempt.attempt_number,
            attempt.scheduled_delay
        );
        self.listener.on_transition(attempt);
    }

    fn close(&self) {
        *self.open.lock().unwrap_or_else(|e| e.into_inner()) = false;
    }
}

pub struct BroadcastPanel {
    config: PanelConfig,
    commands: mpsc::UnboundedSender<PanelCommand>,
    publisher: Arc<Publisher>,
    task: Option<JoinHandle<()>>,
    recording: RecordingController,
}

impl BroadcastPanel {
    /// Open the panel and start connecting immediately
    pub fn open(
        config: PanelConfig,
        relay: Arc<dyn RelayApi>,
        transport: Arc<dyn MediaTransport>,
        listener: Arc<dyn ConnectionListener>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let publisher = Arc::new(Publisher {
            open: Mutex::new(true),
            listener,
        });

        let driver = Driver {
            config: config.clone(),
            relay: relay.clone(),
            transport,
            publisher: publisher.clone(),
            commands: commands_rx,
        };
        let task = tokio::spawn(driver.run());

        tracing::info!(
            "Broadcast panel opened for '{}' in room '{}'",
            config.identity,
            config.room_name
        );

        Self {
            config,
            commands: commands_tx,
            publisher,
            task: Some(task),
            recording: RecordingController::new(relay),
        }
    }

    pub fn room_name(&self) -> &str {
        &self.config.room_name
    }

    pub fn identity(&self) -> &str {
        &self.config.identity
    }

    /// Manual retry; ignored unless the panel is `Failed`
    pub fn retry(&self) {
        self.send(PanelCommand::Retry);
    }

    pub fn set_microphone(&self, enabled: bool) {
        self.send(PanelCommand::Microphone(enabled));
    }

    /// Report local voice activity to the room
    pub fn set_speaking(&self, active: bool) {
        self.send(PanelCommand::Speaking(active));
    }

    pub fn recording(&self) -> &RecordingController {
        &self.recording
    }

    pub fn recording_mut(&mut self) -> &mut RecordingController {
        &mut self.recording
    }

    /// Start recording this panel's room
    pub async fn start_recording(&mut self) -> Result<String, RecordingError> {
        self.recording
            .start(&self.config.room_name, &self.config.identity)
            .await
    }

    pub async fn stop_recording(&mut self) -> Result<(), RecordingError> {
        self.recording.stop().await
    }

    /// Stop the driver synchronously.
    ///
    /// No listener call happens after this returns; a pending retry timer is
    /// cancelled and the media session is dropped.
    pub fn unmount(&mut self) {
        self.publisher.close();
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!("Broadcast panel for room '{}' closed", self.config.room_name);
        }
    }

    /// Close the panel, then release any recording it still holds
    pub async fn close(mut self) {
        self.unmount();
        self.recording.release().await;
    }

    fn send(&self, command: PanelCommand) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Broadcast panel driver is gone, command dropped");
        }
    }
}

impl Drop for BroadcastPanel {
    fn drop(&mut self) {
        self.unmount();
    }
}

struct Driver {
    config: PanelConfig,
    relay: Arc<dyn RelayApi>,
    transport: Arc<dyn MediaTransport>,
    publisher: Arc<Publisher>,
    commands: mpsc::UnboundedReceiver<PanelCommand>,
}

impl Driver {
    async fn run(mut self) {
        let mut attempt = ConnectionAttempt::new();
        self.publisher.publish(&attempt);

        loop {
            let request =
                TokenRequest::publisher(self.config.identity.as_str(), self.config.room_name.as_str());

            match self.relay.fetch_token(request).await {
                Ok(token) => {
                    attempt.on_token_issued();
                    self.publisher.publish(&attempt);

                    let session = self.transport.join(JoinRequest {
                        server_url: self.config.server_url.clone(),
                        token,
                        identity: self.config.identity.clone(),
                        room_name: self.config.room_name.clone(),
                        microphone_enabled: true,
                    });
                    if !self.follow_session(&mut attempt, session).await {
                        return;
                    }
                    if !self.wait_for_manual_retry(&mut attempt).await {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Token fetch for room '{}' failed (attempt {}): {}",
                        self.config.room_name,
                        attempt.attempt_number,
                        e
                    );
                    match attempt.on_token_failed(&self.config.policy) {
                        Step::Retry(delay) => {
                            self.publisher.publish(&attempt);
                            if !self.wait(delay).await {
                                return;
                            }
                        }
                        Step::GiveUp => {
                            tracing::error!(
                                "Giving up on room '{}' after {} failed attempts; manual retry required",
                                self.config.room_name,
                                MAX_AUTOMATIC_ATTEMPTS
                            );
                            self.publisher.publish(&attempt);
                            if !self.wait_for_manual_retry(&mut attempt).await {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Follow the joined session until it ends for good.
    ///
    /// Returns `false` when the panel itself went away.
    async fn follow_session(
        &mut self,
        attempt: &mut ConnectionAttempt,
        mut session: MediaSession,
    ) -> bool {
        loop {
            tokio::select! {
                event = session.next_event() => match event {
                    Some(MediaEvent::Connected) => {
                        if attempt.on_transport_restored() {
                            self.publisher.publish(attempt);
                        }
                    }
                    Some(MediaEvent::Disconnected { reason }) => {
                        tracing::warn!("Broadcast transport lost: {}", reason);
                        if attempt.on_transport_lost() {
                            self.publisher.publish(attempt);
                        }
                    }
                    Some(MediaEvent::MicrophoneChanged(enabled)) => {
                        tracing::info!(
                            "Microphone {} by the room",
                            if enabled { "enabled" } else { "disabled" }
                        );
                    }
                    Some(MediaEvent::ActiveSpeakersChanged(identities)) => {
                        tracing::debug!("Active speakers in '{}': {:?}", self.config.room_name, identities);
                    }
                    Some(MediaEvent::Removed { reason }) => {
                        tracing::warn!("Removed from room '{}': {}", self.config.room_name, reason);
                        attempt.on_session_ended();
                        self.publisher.publish(attempt);
                        return true;
                    }
                    None => {
                        tracing::warn!("Media session for room '{}' ended", self.config.room_name);
                        attempt.on_session_ended();
                        self.publisher.publish(attempt);
                        return true;
                    }
                },
                command = self.commands.recv() => match command {
                    Some(PanelCommand::Microphone(enabled)) => session.set_microphone(enabled),
                    Some(PanelCommand::Speaking(active)) => session.set_speaking(active),
                    Some(PanelCommand::Retry) => {
                        tracing::debug!("Retry ignored while the session is alive");
                    }
                    None => {
                        session.close().await;
                        return false;
                    }
                },
            }
        }
    }

    /// Sleep out a backoff delay. Returns `false` when the panel went away.
    async fn wait(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                command = self.commands.recv() => match command {
                    Some(_) => tracing::debug!("Not connected, panel command dropped"),
                    None => return false,
                },
            }
        }
    }

    /// Block in `Failed` until the operator retries. Returns `false` when the panel went away.
    async fn wait_for_manual_retry(&mut self, attempt: &mut ConnectionAttempt) -> bool {
        while let Some(command) = self.commands.recv().await {
            match command {
                PanelCommand::Retry => {
                    if attempt.manual_retry() {
                        tracing::info!("Manual retry for room '{}'", self.config.room_name);
                        self.publisher.publish(attempt);
                        return true;
                    }
                }
                _ => tracing::debug!("Panel is failed, command dropped"),
            }
        }
        false
    }
}
