//! UseCase: 録音（egress）の開始と停止
//!
//! 1 ルームにつき同時に 1 つの egress のみ。停止後にルームがアイドルなら閉じる。
//! 停止した egress も履歴として残る。

use std::sync::Arc;

use switchboard_shared::{protocol::StartRecordingRequest, time::Clock};
use uuid::Uuid;

use crate::domain::{Egress, MessagePusher, RoomRepository};

use super::{error::RecordingError, signal::close_if_idle};

/// 録音のユースケース
pub struct RecordingUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl RecordingUseCase {
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

    /// 録音を開始し、egress ID を返す
    pub async fn start(&self, request: StartRecordingRequest) -> Result<String, RecordingError> {
        let room_name = request.room_name.trim();
        if room_name.is_empty() {
            return Err(RecordingError::MissingField("roomName"));
        }

        let egress_id = format!("EG_{}", Uuid::new_v4().simple());
        self.repository
            .start_recording(Egress {
                egress_id: egress_id.clone(),
                room_name: room_name.to_string(),
                initiator: request.initiator.clone(),
                started_at: self.clock.now_millis(),
                ended_at: None,
            })
            .await?;
        tracing::info!(
            "Recording of '{}' started by '{}' (egress {})",
            room_name,
            request.initiator,
            egress_id
        );
        Ok(egress_id)
    }

    /// 録音を停止する
    pub async fn stop(&self, egress_id: &str) -> Result<(), RecordingError> {
        if egress_id.trim().is_empty() {
            return Err(RecordingError::MissingField("egressId"));
        }

        let egress = self
            .repository
            .stop_recording(egress_id, self.clock.now_millis())
            .await?;
        tracing::info!(
            "Recording of '{}' stopped (egress {})",
            egress.room_name,
            egress_id
        );

        close_if_idle(
            self.repository.as_ref(),
            self.message_pusher.as_ref(),
            &egress.room_name,
        )
        .await;
        Ok(())
    }

    /// 録音の履歴（新しい順）
    pub async fn history(&self) -> Vec<Egress> {
        self.repository.list_recordings().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_shared::time::FixedClock;

    use crate::{
        domain::{Grant, Participant},
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository,
        },
    };

    fn start_request(room_name: &str) -> StartRecordingRequest {
        StartRecordingRequest {
            room_name: room_name.to_string(),
            initiator: "admin".to_string(),
        }
    }

    async fn repository_with_publisher() -> Arc<InMemoryRoomRepository> {
        let repository = Arc::new(InMemoryRoomRepository::new());
        let grant = Grant {
            token: "token-alice".to_string(),
            identity: "alice".to_string(),
            room_name: "Lobby".to_string(),
            can_publish: true,
        };
        repository.issue_grant(grant.clone()).await.unwrap();
        repository
            .add_participant("Lobby", Participant::new(&grant, 0))
            .await
            .unwrap();
        repository
    }

    fn create_usecase(repository: Arc<InMemoryRoomRepository>) -> RecordingUseCase {
        RecordingUseCase::new(
            repository,
            Arc::new(WebSocketMessagePusher::new()),
            Arc::new(FixedClock::new(5_000)),
        )
    }

    #[tokio::test]
    async fn test_start_returns_egress_id() {
        // テスト項目: 録音開始で EG_ で始まる egress ID が返り、ルームが録音中になる
        // given (前提条件):
        let repository = repository_with_publisher().await;
        let usecase = create_usecase(repository.clone());

        // when (操作):
        let egress_id = usecase.start(start_request("Lobby")).await.unwrap();

        // then (期待する結果):
        assert!(egress_id.starts_with("EG_"));
        assert_eq!(
            repository.get_room("Lobby").await.unwrap().recording,
            Some(egress_id)
        );
    }

    #[tokio::test]
    async fn test_second_start_is_conflict() {
        // テスト項目: 録音中のルームでの二重開始は AlreadyRecording になる
        // given (前提条件):
        let repository = repository_with_publisher().await;
        let usecase = create_usecase(repository);
        let first = usecase.start(start_request("Lobby")).await.unwrap();

        // when (操作):
        let second = usecase.start(start_request("Lobby")).await;

        // then (期待する結果):
        assert_eq!(
            second,
            Err(RecordingError::AlreadyRecording {
                room: "Lobby".to_string(),
                egress_id: first,
            })
        );
    }

    #[tokio::test]
    async fn test_start_in_unknown_room_fails() {
        // テスト項目: 存在しないルームの録音開始は RoomNotFound
        // given (前提条件):
        let usecase = create_usecase(Arc::new(InMemoryRoomRepository::new()));

        // when (操作):
        let result = usecase.start(start_request("Nowhere")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RecordingError::RoomNotFound("Nowhere".to_string()))
        );
    }

    #[tokio::test]
    async fn test_stop_unknown_egress_fails() {
        // テスト項目: 不明な egress の停止は EgressNotFound
        // given (前提条件):
        let usecase = create_usecase(repository_with_publisher().await);

        // when (操作):
        let result = usecase.stop("EG_missing").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RecordingError::EgressNotFound("EG_missing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_stop_closes_room_without_publishers() {
        // テスト項目: publisher のいないルームは録音停止で閉じられる
        // given (前提条件):
        let repository = repository_with_publisher().await;
        let usecase = create_usecase(repository.clone());
        let egress_id = usecase.start(start_request("Lobby")).await.unwrap();
        repository
            .remove_participant("Lobby", "alice", None)
            .await
            .unwrap();
        // 録音中はアイドルではない
        assert!(repository.delete_room_if_idle("Lobby").await.unwrap().is_none());

        // when (操作):
        usecase.stop(&egress_id).await.unwrap();

        // then (期待する結果):
        assert!(repository.list_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_history_records_initiator_and_times() {
        // テスト項目: 停止した録音が開始者・開始/停止時刻とともに履歴に残る
        // given (前提条件):
        let repository = repository_with_publisher().await;
        let usecase = create_usecase(repository);
        let egress_id = usecase.start(start_request("Lobby")).await.unwrap();
        usecase.stop(&egress_id).await.unwrap();

        // when (操作):
        let history = usecase.history().await;

        // then (期待する結果):
        assert_eq!(
            history,
            vec![Egress {
                egress_id,
                room_name: "Lobby".to_string(),
                initiator: "admin".to_string(),
                started_at: 5_000,
                ended_at: Some(5_000),
            }]
        );
    }
}
