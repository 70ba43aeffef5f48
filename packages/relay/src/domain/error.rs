//! ドメイン層のエラー定義

use thiserror::Error;

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    #[error("Participant '{0}' not found")]
    ParticipantNotFound(String),

    #[error("Identity '{0}' is already connected")]
    DuplicateIdentity(String),

    #[error("Room '{room}' is already being recorded (egress {egress_id})")]
    AlreadyRecording { room: String, egress_id: String },

    #[error("Egress '{0}' not found")]
    EgressNotFound(String),
}

/// メッセージ送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Client '{0}' not found")]
    ClientNotFound(String),

    #[error("Push failed: {0}")]
    PushFailed(String),
}
