//! WebSocket を使った MessagePusher 実装
//!
//! WebSocket 接続の受付と sender の生成は UI 層（`ui/handler/websocket.rs`）で行い、
//! ここでは受け取った sender を `SessionKey` ごとに管理してシグナルを送る。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{MessagePushError, MessagePusher, PusherChannel, SessionKey};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のセッションの接続 ID と WebSocket sender
    sessions: Mutex<HashMap<SessionKey, (Uuid, PusherChannel)>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, key: SessionKey, connection_id: Uuid, sender: PusherChannel) {
        let mut sessions = self.sessions.lock().await;
        tracing::debug!(
            "Session '{}' in '{}' registered to MessagePusher",
            key.identity,
            key.room_name
        );
        sessions.insert(key, (connection_id, sender));
    }

    async fn unregister_client(&self, key: &SessionKey, connection_id: Option<Uuid>) {
        let mut sessions = self.sessions.lock().await;
        let current = sessions
            .get(key)
            .is_some_and(|(id, _)| connection_id.is_none_or(|expected| *id == expected));
        if current {
            sessions.remove(key);
            tracing::debug!(
                "Session '{}' in '{}' unregistered from MessagePusher",
                key.identity,
                key.room_name
            );
        }
    }

    async fn push_to(&self, key: &SessionKey, content: &str) -> Result<(), MessagePushError> {
        let sessions = self.sessions.lock().await;

        let (_, sender) = sessions
            .get(key)
            .ok_or_else(|| MessagePushError::ClientNotFound(key.identity.clone()))?;
        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed signal to '{}'", key.identity);
        Ok(())
    }

    async fn broadcast(&self, targets: Vec<SessionKey>, content: &str) {
        let sessions = self.sessions.lock().await;

        for target in targets {
            match sessions.get(&target) {
                // 一部の送信失敗は許容
                Some((_, sender)) => {
                    if let Err(e) = sender.send(content.to_string()) {
                        tracing::warn!("Failed to push signal to '{}': {}", target.identity, e);
                    }
                }
                None => tracing::warn!(
                    "Session '{}' not found during broadcast, skipping",
                    target.identity
                ),
            }
        }
    }
}
