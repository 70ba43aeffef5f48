//! UseCase: `/rtc` セッション
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SessionUseCase の join / leave / set_speaking / set_microphone
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加直後に Joined と現在のアクティブスピーカーが届く
//! - 正常系：発話状態の変化がルームの全員に通知される
//! - 異常系：不明なトークン、同じ identity の二重接続
//! - エッジケース：古い接続の切断処理は新しい接続に影響しない
//! - エッジケース：最後の publisher が抜けたらルームが閉じる

use std::sync::Arc;

use switchboard_shared::{protocol::ServerSignal, time::Clock};
use uuid::Uuid;

use crate::domain::{
    MessagePusher, Participant, PusherChannel, RepositoryError, RoomRepository, SessionKey,
};

use super::{
    error::JoinError,
    signal::{announce_speakers, close_if_idle, push_signal},
};

/// 受け付けた接続
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedSession {
    pub key: SessionKey,
    pub connection_id: Uuid,
    pub can_publish: bool,
}

/// `/rtc` セッションのユースケース
pub struct SessionUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SessionUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    /// トークンを検証して参加者を追加し、送信チャンネルを登録する
    ///
    /// 参加者本人には `Joined` と現在のアクティブスピーカーを送る
    pub async fn join(&self, token: &str, sender: PusherChannel) -> Result<JoinedSession, JoinError> {
        let grant = self
            .repository
            .find_grant(token)
            .await
            .ok_or(JoinError::InvalidToken)?;

        let participant = Participant::new(&grant, self.clock.now_millis());
        let session = JoinedSession {
            key: SessionKey::new(grant.room_name.clone(), grant.identity.clone()),
            connection_id: participant.connection_id,
            can_publish: participant.can_publish,
        };

        let update = self
            .repository
            .add_participant(&grant.room_name, participant)
            .await?;
        self.message_pusher
            .register_client(session.key.clone(), session.connection_id, sender)
            .await;
        tracing::info!(
            "'{}' joined room '{}' ({})",
            grant.identity,
            grant.room_name,
            if grant.can_publish { "publisher" } else { "listener" }
        );

        let welcome = [
            ServerSignal::Joined {
                room: update.room.name.clone(),
                identity: grant.identity.clone(),
                participants: update.room.members(),
            },
            ServerSignal::ActiveSpeakers {
                identities: update.room.active_speakers(),
            },
        ];
        for signal in &welcome {
            push_signal(self.message_pusher.as_ref(), vec![session.key.clone()], signal).await;
        }

        Ok(session)
    }

    /// 接続の終了を処理する
    ///
    /// 既に削除された接続（ログアウト済み・再接続済み）では何もしない
    pub async fn leave(&self, session: &JoinedSession) {
        self.message_pusher
            .unregister_client(&session.key, Some(session.connection_id))
            .await;

        let result = self
            .repository
            .remove_participant(
                &session.key.room_name,
                &session.key.identity,
                Some(session.connection_id),
            )
            .await;
        let (participant, update) = match result {
            Ok(removed) => removed,
            Err(RepositoryError::RoomNotFound(_) | RepositoryError::ParticipantNotFound(_)) => {
                tracing::debug!("'{}' was already removed", session.key.identity);
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to remove '{}': {}", session.key.identity, e);
                return;
            }
        };
        tracing::info!(
            "'{}' left room '{}'",
            participant.identity,
            session.key.room_name
        );

        announce_speakers(self.message_pusher.as_ref(), &update).await;
        if participant.can_publish {
            close_if_idle(
                self.repository.as_ref(),
                self.message_pusher.as_ref(),
                &session.key.room_name,
            )
            .await;
        }
    }

    /// 発話状態を更新し、変化があれば通知する
    pub async fn set_speaking(
        &self,
        session: &JoinedSession,
        speaking: bool,
    ) -> Result<(), RepositoryError> {
        let update = self
            .repository
            .set_speaking(&session.key.room_name, &session.key.identity, speaking)
            .await?;
        announce_speakers(self.message_pusher.as_ref(), &update).await;
        Ok(())
    }

    /// マイク状態を更新し、変化があれば通知する
    pub async fn set_microphone(
        &self,
        session: &JoinedSession,
        enabled: bool,
    ) -> Result<(), RepositoryError> {
        let update = self
            .repository
            .set_microphone(&session.key.room_name, &session.key.identity, enabled)
            .await?;
        announce_speakers(self.message_pusher.as_ref(), &update).await;
        Ok(())
    }
}
