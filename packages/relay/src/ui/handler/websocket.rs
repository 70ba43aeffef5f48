//! `/rtc` signalling WebSocket handler.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use switchboard_shared::protocol::ClientSignal;
use tokio::sync::mpsc;

use crate::{
    ui::state::AppState,
    usecase::{JoinError, JoinedSession},
};

/// Query parameters for the signalling connection
#[derive(Debug, Deserialize)]
pub struct RtcQuery {
    pub token: String,
}

pub async fn rtc_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RtcQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Create a channel for this session to receive signals
    let (tx, rx) = mpsc::unbounded_channel();

    let session = match state.session_usecase.join(&query.token, tx).await {
        Ok(session) => session,
        Err(JoinError::InvalidToken) => {
            tracing::warn!("Rejected /rtc connection with unknown token");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(JoinError::DuplicateIdentity(identity)) => {
            tracing::warn!(
                "'{}' is already connected. Rejecting connection.",
                identity
            );
            return Err(StatusCode::CONFLICT);
        }
        Err(JoinError::RoomNotFound(room)) => {
            tracing::warn!("Room '{}' is gone. Rejecting connection.", room);
            return Err(StatusCode::NOT_FOUND);
        }
    };

    let failed_state = state.clone();
    let failed_session = session.clone();
    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!(
                "WebSocket upgrade for '{}' failed: {}",
                failed_session.key.identity,
                e
            );
            tokio::spawn(async move {
                failed_state.session_usecase.leave(&failed_session).await;
            });
        })
        .on_upgrade(move |socket| handle_socket(socket, state, session, rx)))
}

/// Forward queued signals from the rx channel to the WebSocket sender.
///
/// Ends when the channel closes, i.e. when the session is unregistered.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    session: JoinedSession,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    let state_clone = state.clone();
    let session_clone = session.clone();

    // Spawn a task to receive signals from this participant
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let signal = match serde_json::from_str::<ClientSignal>(&text) {
                        Ok(signal) => signal,
                        Err(e) => {
                            tracing::warn!("Ignoring malformed signal '{}': {}", text, e);
                            continue;
                        }
                    };

                    let usecase = &state_clone.session_usecase;
                    let result = match signal {
                        ClientSignal::Speaking { active } => {
                            usecase.set_speaking(&session_clone, active).await
                        }
                        ClientSignal::Microphone { enabled } => {
                            usecase.set_microphone(&session_clone, enabled).await
                        }
                    };
                    if let Err(e) = result {
                        tracing::warn!(
                            "Failed to apply signal from '{}': {}",
                            session_clone.key.identity,
                            e
                        );
                    }
                }
                Message::Close(_) => {
                    tracing::info!("'{}' requested close", session_clone.key.identity);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push signals to this participant
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.session_usecase.leave(&session).await;
}
