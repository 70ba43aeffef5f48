//! UseCase: 管理者のルームコマンド
//!
//! - mute-all / unmute-all: publisher 全員のマイクを切り替え、各自に `Microphone` を送る
//! - logout-all: publisher 全員を切り離す（監視用参加者は残す）
//! - logout-user: 1 人を切り離す

use std::sync::Arc;

use switchboard_shared::protocol::ServerSignal;

use crate::domain::{MessagePusher, RoomRepository, SessionKey};

use super::{
    error::RoomCommandError,
    signal::{announce_speakers, close_if_idle, push_signal, remove_session},
};

/// 管理者にログアウトされた参加者へ送る理由
pub const LOGGED_OUT: &str = "logged out by admin";

/// ルームコマンドのユースケース
pub struct RoomCommandUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RoomCommandUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// publisher 全員のマイクを切り替え、対象の identity を返す
    pub async fn set_all_microphones(
        &self,
        room_name: &str,
        enabled: bool,
    ) -> Result<Vec<String>, RoomCommandError> {
        let room_name = require("roomName", room_name)?;
        let (affected, update) = self
            .repository
            .set_all_microphones(room_name, enabled)
            .await?;

        let targets = affected
            .iter()
            .map(|identity| SessionKey::new(room_name, identity.clone()))
            .collect();
        push_signal(
            self.message_pusher.as_ref(),
            targets,
            &ServerSignal::Microphone { enabled },
        )
        .await;
        announce_speakers(self.message_pusher.as_ref(), &update).await;

        tracing::info!(
            "{} {} participant(s) in '{}'",
            if enabled { "Unmuted" } else { "Muted" },
            affected.len(),
            room_name
        );
        Ok(affected)
    }

    /// publisher 全員を切り離し、対象の identity を返す
    pub async fn logout_all(&self, room_name: &str) -> Result<Vec<String>, RoomCommandError> {
        let room_name = require("roomName", room_name)?;
        let (removed, update) = self.repository.remove_publishers(room_name).await?;

        let mut identities = Vec::with_capacity(removed.len());
        for participant in removed {
            remove_session(
                self.message_pusher.as_ref(),
                SessionKey::new(room_name, participant.identity.clone()),
                LOGGED_OUT,
            )
            .await;
            identities.push(participant.identity);
        }
        announce_speakers(self.message_pusher.as_ref(), &update).await;
        close_if_idle(
            self.repository.as_ref(),
            self.message_pusher.as_ref(),
            room_name,
        )
        .await;

        tracing::info!("Logged out {} participant(s) from '{}'", identities.len(), room_name);
        Ok(identities)
    }

    /// 1 人を切り離す
    pub async fn logout_user(&self, room_name: &str, identity: &str) -> Result<(), RoomCommandError> {
        let room_name = require("roomName", room_name)?;
        let identity = require("identity", identity)?;
        let (participant, update) = self
            .repository
            .remove_participant(room_name, identity, None)
            .await?;

        remove_session(
            self.message_pusher.as_ref(),
            SessionKey::new(room_name, identity),
            LOGGED_OUT,
        )
        .await;
        announce_speakers(self.message_pusher.as_ref(), &update).await;
        if participant.can_publish {
            close_if_idle(
                self.repository.as_ref(),
                self.message_pusher.as_ref(),
                room_name,
            )
            .await;
        }

        tracing::info!("Logged out '{}' from '{}'", identity, room_name);
        Ok(())
    }
}

fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, RoomCommandError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RoomCommandError::MissingField(field));
    }
    Ok(value)
}
