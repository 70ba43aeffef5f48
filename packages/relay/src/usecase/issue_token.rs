//! UseCase: セッショントークンの発行
//!
//! トークンは不透明な UUID 文字列で、`/rtc` への接続時に参加権限と引き換える。
//! ルームはトークン発行では作らず、最初の publisher が `/rtc` に参加したときに作る。
//! 監視用（listen-only）のトークンは既存のルームにだけ発行する。

use std::sync::Arc;

use switchboard_shared::protocol::TokenRequest;
use uuid::Uuid;

use crate::domain::{Grant, RoomRepository};

use super::error::TokenError;

/// トークン発行のユースケース
pub struct IssueTokenUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl IssueTokenUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// トークンを発行する
    pub async fn execute(&self, request: TokenRequest) -> Result<String, TokenError> {
        let identity = request.identity.trim();
        let room_name = request.room_name.trim();
        if identity.is_empty() {
            return Err(TokenError::MissingField("identity"));
        }
        if room_name.is_empty() {
            return Err(TokenError::MissingField("roomName"));
        }

        if !request.can_publish && self.repository.get_room(room_name).await.is_err() {
            return Err(TokenError::RoomNotFound(room_name.to_string()));
        }

        let grant = Grant {
            token: Uuid::new_v4().to_string(),
            identity: identity.to_string(),
            room_name: room_name.to_string(),
            can_publish: request.can_publish,
        };
        let token = grant.token.clone();
        self.repository.issue_grant(grant).await?;

        tracing::info!(
            "Issued {} token for '{}' in room '{}'",
            if request.can_publish { "publisher" } else { "listener" },
            identity,
            room_name
        );
        Ok(token)
    }
}
