//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::RepositoryError;

/// トークン発行のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    /// 監視用トークンは既存のルームにのみ発行する
    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// `/rtc` 参加のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Unknown or expired token")]
    InvalidToken,

    #[error("Identity '{0}' is already connected")]
    DuplicateIdentity(String),

    #[error("Room '{0}' not found")]
    RoomNotFound(String),
}

impl From<RepositoryError> for JoinError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::DuplicateIdentity(identity) => JoinError::DuplicateIdentity(identity),
            RepositoryError::RoomNotFound(room) => JoinError::RoomNotFound(room),
            other => JoinError::RoomNotFound(other.to_string()),
        }
    }
}

/// 録音開始・停止のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    #[error("Room '{room}' is already being recorded (egress {egress_id})")]
    AlreadyRecording { room: String, egress_id: String },

    #[error("Egress '{0}' not found")]
    EgressNotFound(String),
}

impl From<RepositoryError> for RecordingError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::AlreadyRecording { room, egress_id } => {
                RecordingError::AlreadyRecording { room, egress_id }
            }
            RepositoryError::EgressNotFound(egress_id) => RecordingError::EgressNotFound(egress_id),
            RepositoryError::RoomNotFound(room) => RecordingError::RoomNotFound(room),
            other => RecordingError::RoomNotFound(other.to_string()),
        }
    }
}

/// ルームコマンド（mute-all など）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomCommandError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    #[error("Participant '{0}' not found")]
    ParticipantNotFound(String),
}

impl From<RepositoryError> for RoomCommandError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::ParticipantNotFound(identity) => {
                RoomCommandError::ParticipantNotFound(identity)
            }
            RepositoryError::RoomNotFound(room) => RoomCommandError::RoomNotFound(room),
            other => RoomCommandError::RoomNotFound(other.to_string()),
        }
    }
}
