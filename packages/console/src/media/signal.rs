//! WebSocket signalling transport.
//!
//! Speaks the relay's `/rtc` protocol and reconnects forever with the shared
//! [`RetryPolicy`] until the session is left or the participant is removed.

use futures_util::{SinkExt, StreamExt};
use switchboard_shared::protocol::{ClientSignal, ServerSignal};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Error as WsError, protocol::Message},
};

use crate::{error::TransportError, retry::RetryPolicy};

use super::{JoinRequest, MediaControl, MediaEvent, MediaSession, MediaTransport};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Reason reported when the relay refuses the session token
pub const TOKEN_REJECTED: &str = "token rejected";

/// Upgrade statuses that retrying the same token can never get past
fn ends_session(status: u16) -> bool {
    matches!(status, 401 | 404)
}

/// Media transport backed by the relay's signalling WebSocket
#[derive(Debug, Clone, Default)]
pub struct SignalTransport {
    policy: RetryPolicy,
}

impl SignalTransport {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

impl MediaTransport for SignalTransport {
    fn join(&self, request: JoinRequest) -> MediaSession {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (controls_tx, controls_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_session(request, self.policy, events_tx, controls_rx));
        MediaSession::new(events_rx, controls_tx, Some(task))
    }
}

/// Local participant state replayed after every reconnect
#[derive(Debug, Clone, Copy)]
struct LocalState {
    microphone: bool,
    speaking: bool,
}

/// Why one connected stretch of the session ended
enum SessionEnd {
    Left,
    Removed(String),
    Lost(TransportError),
}

async fn run_session(
    request: JoinRequest,
    policy: RetryPolicy,
    events: mpsc::UnboundedSender<MediaEvent>,
    mut controls: mpsc::UnboundedReceiver<MediaControl>,
) {
    let url = format!("{}?token={}", request.server_url, request.token);
    let mut local = LocalState {
        microphone: request.microphone_enabled,
        speaking: false,
    };
    let mut attempt: u32 = 0;
    let mut reported_down = false;

    loop {
        match connect_async(url.as_str()).await {
            Ok((socket, _response)) => {
                tracing::info!(
                    "Media session for '{}' connected to room '{}'",
                    request.identity,
                    request.room_name
                );
                attempt = 0;
                reported_down = false;
                let _ = events.send(MediaEvent::Connected);

                match pump(socket, &mut local, &events, &mut controls).await {
                    SessionEnd::Left => {
                        tracing::info!("Media session for '{}' left", request.identity);
                        return;
                    }
                    SessionEnd::Removed(reason) => {
                        tracing::warn!(
                            "'{}' was removed from room '{}': {}",
                            request.identity,
                            request.room_name,
                            reason
                        );
                        let _ = events.send(MediaEvent::Removed { reason });
                        return;
                    }
                    SessionEnd::Lost(e) => {
                        tracing::warn!("Media session for '{}' lost: {}", request.identity, e);
                        reported_down = true;
                        let _ = events.send(MediaEvent::Disconnected {
                            reason: e.to_string(),
                        });
                    }
                }
            }
            Err(WsError::Http(response)) if ends_session(response.status().as_u16()) => {
                tracing::warn!(
                    "Relay refused the token of '{}' for room '{}' ({})",
                    request.identity,
                    request.room_name,
                    response.status()
                );
                let _ = events.send(MediaEvent::Removed {
                    reason: TOKEN_REJECTED.to_string(),
                });
                return;
            }
            Err(e) => {
                let error = TransportError::Connect(e.to_string());
                tracing::warn!("{} (identity '{}')", error, request.identity);
                if !reported_down {
                    reported_down = true;
                    let _ = events.send(MediaEvent::Disconnected {
                        reason: error.to_string(),
                    });
                }
            }
        }

        attempt = attempt.saturating_add(1);
        let delay = policy.delay(attempt);
        tracing::info!(
            "Reconnecting media session for '{}' in {:?} (attempt {})",
            request.identity,
            delay,
            attempt
        );
        if !wait_backoff(delay, &mut local, &mut controls).await {
            return;
        }
    }
}

/// Sleep for `delay` while still accepting controls.
///
/// Returns `false` when the session was left during the wait.
async fn wait_backoff(
    delay: std::time::Duration,
    local: &mut LocalState,
    controls: &mut mpsc::UnboundedReceiver<MediaControl>,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            control = controls.recv() => match control {
                Some(MediaControl::Microphone(enabled)) => local.microphone = enabled,
                Some(MediaControl::Speaking(active)) => local.speaking = active,
                Some(MediaControl::Leave) | None => return false,
            },
        }
    }
}

async fn send_signal(
    write: &mut futures_util::stream::SplitSink<Socket, Message>,
    signal: &ClientSignal,
) -> Result<(), TransportError> {
    let json =
        serde_json::to_string(signal).map_err(|e| TransportError::Protocol(e.to_string()))?;
    write
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| TransportError::Closed(e.to_string()))
}

/// Relay messages both ways until the connection ends
async fn pump(
    socket: Socket,
    local: &mut LocalState,
    events: &mpsc::UnboundedSender<MediaEvent>,
    controls: &mut mpsc::UnboundedReceiver<MediaControl>,
) -> SessionEnd {
    let (mut write, mut read) = socket.split();

    // Replay local state so the relay matches us after a reconnect
    let replay = [
        ClientSignal::Microphone {
            enabled: local.microphone,
        },
        ClientSignal::Speaking {
            active: local.speaking,
        },
    ];
    for signal in &replay {
        if let Err(e) = send_signal(&mut write, signal).await {
            return SessionEnd::Lost(e);
        }
    }

    loop {
        tokio::select! {
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerSignal>(&text) {
                    Ok(ServerSignal::Joined { room, participants, .. }) => {
                        tracing::debug!("Joined '{}' with {} participant(s)", room, participants.len());
                    }
                    Ok(ServerSignal::ActiveSpeakers { identities }) => {
                        let _ = events.send(MediaEvent::ActiveSpeakersChanged(identities));
                    }
                    Ok(ServerSignal::Microphone { enabled }) => {
                        local.microphone = enabled;
                        let _ = events.send(MediaEvent::MicrophoneChanged(enabled));
                    }
                    Ok(ServerSignal::Removed { reason }) => {
                        let _ = write.send(Message::Close(None)).await;
                        return SessionEnd::Removed(reason);
                    }
                    Err(e) => {
                        tracing::warn!("{}", TransportError::Protocol(e.to_string()));
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    return SessionEnd::Lost(TransportError::Closed("closed by relay".to_string()));
                }
                Some(Err(e)) => {
                    return SessionEnd::Lost(TransportError::Closed(e.to_string()));
                }
                Some(Ok(_)) => {}
            },
            control = controls.recv() => {
                let signal = match control {
                    Some(MediaControl::Microphone(enabled)) => {
                        local.microphone = enabled;
                        ClientSignal::Microphone { enabled }
                    }
                    Some(MediaControl::Speaking(active)) => {
                        local.speaking = active;
                        ClientSignal::Speaking { active }
                    }
                    Some(MediaControl::Leave) | None => {
                        let _ = write.send(Message::Close(None)).await;
                        return SessionEnd::Left;
                    }
                };
                if let Err(e) = send_signal(&mut write, &signal).await {
                    return SessionEnd::Lost(e);
                }
            }
        }
    }
}
