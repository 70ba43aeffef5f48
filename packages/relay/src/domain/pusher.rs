//! MessagePusher trait 定義
//!
//! 接続中のセッションへのメッセージ送信を抽象化する。

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::MessagePushError;

/// セッションへの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// ルーム内の 1 セッションを指すキー
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub room_name: String,
    pub identity: String,
}

impl SessionKey {
    pub fn new(room_name: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            room_name: room_name.into(),
            identity: identity.into(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// セッションを登録（同じキーの古い接続は置き換える）
    async fn register_client(&self, key: SessionKey, connection_id: Uuid, sender: PusherChannel);

    /// セッションの登録を解除（送信チャンネルを破棄するとソケットも閉じる）
    ///
    /// `connection_id` を指定した場合、その接続が登録されているときだけ解除する
    async fn unregister_client(&self, key: &SessionKey, connection_id: Option<Uuid>);

    /// 1 セッションに送信
    async fn push_to(&self, key: &SessionKey, content: &str) -> Result<(), MessagePushError>;

    /// 複数セッションに送信（一部の失敗は許容）
    async fn broadcast(&self, targets: Vec<SessionKey>, content: &str);
}
