//! Repository trait 定義
//!
//! UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。

use async_trait::async_trait;
use uuid::Uuid;

use super::{Egress, Grant, Participant, RepositoryError, Room, RoomUpdate};

/// ルーム・トークン・録音の保存先
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// トークンを保存（同じ identity・ルームの古いトークンは置き換える）
    async fn issue_grant(&self, grant: Grant) -> Result<(), RepositoryError>;

    /// トークンから参加権限を取得
    async fn find_grant(&self, token: &str) -> Option<Grant>;

    /// 参加者を追加
    ///
    /// ルームが無い場合、publisher なら参加時刻でルームを作成し、監視用なら RoomNotFound
    async fn add_participant(
        &self,
        room_name: &str,
        participant: Participant,
    ) -> Result<RoomUpdate, RepositoryError>;

    /// 参加者を削除
    async fn remove_participant(
        &self,
        room_name: &str,
        identity: &str,
        connection_id: Option<Uuid>,
    ) -> Result<(Participant, RoomUpdate), RepositoryError>;

    /// 発話状態を更新
    async fn set_speaking(
        &self,
        room_name: &str,
        identity: &str,
        speaking: bool,
    ) -> Result<RoomUpdate, RepositoryError>;

    /// 1 人のマイク状態を更新
    async fn set_microphone(
        &self,
        room_name: &str,
        identity: &str,
        enabled: bool,
    ) -> Result<RoomUpdate, RepositoryError>;

    /// 全 publisher のマイク状態を更新し、対象の identity を返す
    async fn set_all_microphones(
        &self,
        room_name: &str,
        enabled: bool,
    ) -> Result<(Vec<String>, RoomUpdate), RepositoryError>;

    /// 全 publisher を削除
    async fn remove_publishers(
        &self,
        room_name: &str,
    ) -> Result<(Vec<Participant>, RoomUpdate), RepositoryError>;

    /// アイドルならルームを削除し、削除したルームを返す
    async fn delete_room_if_idle(&self, room_name: &str) -> Result<Option<Room>, RepositoryError>;

    async fn get_room(&self, room_name: &str) -> Result<Room, RepositoryError>;

    /// 全ルーム（名前順）
    async fn list_rooms(&self) -> Vec<Room>;

    /// 録音開始を記録（ルームは 1 つの録音のみ）
    async fn start_recording(&self, egress: Egress) -> Result<(), RepositoryError>;

    /// 録音停止を記録し、停止した egress を返す
    async fn stop_recording(&self, egress_id: &str, now: i64) -> Result<Egress, RepositoryError>;

    /// 録音の履歴（新しい順、録音中を含む）
    async fn list_recordings(&self) -> Vec<Egress>;
}
