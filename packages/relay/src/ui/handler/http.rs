//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use switchboard_shared::{
    protocol::{
        Ack, ErrorBody, LogoutUserRequest, RecordingSnapshot, RoomRequest, RoomSnapshot,
        StartRecordingRequest, StartRecordingResponse, StopRecordingRequest, TokenRequest,
        TokenResponse,
    },
    time::timestamp_to_rfc3339,
};

use crate::{
    domain::{Egress, Room},
    usecase::{RecordingError, RoomCommandError, TokenError},
    ui::state::AppState,
};

/// Error response: status code plus `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl ToString) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(error: TokenError) -> Self {
        let status = match &error {
            TokenError::MissingField(_) => StatusCode::BAD_REQUEST,
            TokenError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            TokenError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error)
    }
}

impl From<RecordingError> for ApiError {
    fn from(error: RecordingError) -> Self {
        let status = match &error {
            RecordingError::MissingField(_) => StatusCode::BAD_REQUEST,
            RecordingError::RoomNotFound(_) | RecordingError::EgressNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            RecordingError::AlreadyRecording { .. } => StatusCode::CONFLICT,
        };
        Self::new(status, error)
    }
}

impl From<RoomCommandError> for ApiError {
    fn from(error: RoomCommandError) -> Self {
        let status = match &error {
            RoomCommandError::MissingField(_) => StatusCode::BAD_REQUEST,
            RoomCommandError::RoomNotFound(_) | RoomCommandError::ParticipantNotFound(_) => {
                StatusCode::NOT_FOUND
            }
        };
        Self::new(status, error)
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

const ACK: Ack = Ack { ok: true };

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// `POST /token`
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TokenRequest>,
) -> ApiResult<TokenResponse> {
    let token = state.issue_token_usecase.execute(request).await?;
    Ok(Json(TokenResponse { token }))
}

/// `POST /start-session-recording`
pub async fn start_session_recording(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRecordingRequest>,
) -> ApiResult<StartRecordingResponse> {
    let egress_id = state.recording_usecase.start(request).await?;
    Ok(Json(StartRecordingResponse { egress_id }))
}

/// `POST /stop-session-recording`
pub async fn stop_session_recording(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StopRecordingRequest>,
) -> ApiResult<Ack> {
    state.recording_usecase.stop(&request.egress_id).await?;
    Ok(Json(ACK))
}

/// `POST /mute-all`
pub async fn mute_all(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RoomRequest>,
) -> ApiResult<Ack> {
    state
        .room_command_usecase
        .set_all_microphones(&request.room_name, false)
        .await?;
    Ok(Json(ACK))
}

/// `POST /unmute-all`
pub async fn unmute_all(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RoomRequest>,
) -> ApiResult<Ack> {
    state
        .room_command_usecase
        .set_all_microphones(&request.room_name, true)
        .await?;
    Ok(Json(ACK))
}

/// `POST /logout-all`
pub async fn logout_all(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RoomRequest>,
) -> ApiResult<Ack> {
    state
        .room_command_usecase
        .logout_all(&request.room_name)
        .await?;
    Ok(Json(ACK))
}

/// `POST /logout-user`
pub async fn logout_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LogoutUserRequest>,
) -> ApiResult<Ack> {
    state
        .room_command_usecase
        .logout_user(&request.room_name, &request.identity)
        .await?;
    Ok(Json(ACK))
}

/// `GET /api/rooms`
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSnapshot>> {
    let rooms = state.list_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(rooms.iter().map(to_snapshot).collect())
}

fn to_snapshot(room: &Room) -> RoomSnapshot {
    RoomSnapshot {
        name: room.name.clone(),
        participants: room.publishers(),
        recording: room.recording.clone(),
        created_at: timestamp_to_rfc3339(room.created_at),
    }
}

/// `GET /api/recordings`
pub async fn get_recordings(State(state): State<Arc<AppState>>) -> Json<Vec<RecordingSnapshot>> {
    let egresses = state.recording_usecase.history().await;
    Json(egresses.iter().map(to_recording_snapshot).collect())
}

fn to_recording_snapshot(egress: &Egress) -> RecordingSnapshot {
    RecordingSnapshot {
        egress_id: egress.egress_id.clone(),
        room_name: egress.room_name.clone(),
        initiator: egress.initiator.clone(),
        started_at: timestamp_to_rfc3339(egress.started_at),
        ended_at: egress.ended_at.map(timestamp_to_rfc3339),
        duration_secs: egress.duration_millis().map(|millis| millis / 1_000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Grant, Participant};

    #[test]
    fn test_recording_errors_map_to_status_codes() {
        // テスト項目: 録音エラーが 400 / 404 / 409 に対応する
        // given (前提条件):
        let cases = [
            (RecordingError::MissingField("roomName"), StatusCode::BAD_REQUEST),
            (
                RecordingError::RoomNotFound("Lobby".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                RecordingError::EgressNotFound("EG_1".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                RecordingError::AlreadyRecording {
                    room: "Lobby".to_string(),
                    egress_id: "EG_1".to_string(),
                },
                StatusCode::CONFLICT,
            ),
        ];

        for (error, expected) in cases {
            // when (操作):
            let api_error = ApiError::from(error);

            // then (期待する結果):
            assert_eq!(api_error.status, expected);
        }
    }

    #[test]
    fn test_room_command_error_keeps_message() {
        // テスト項目: エラーメッセージがレスポンス本文に入る
        // given (前提条件):
        let error = RoomCommandError::ParticipantNotFound("ghost".to_string());

        // when (操作):
        let api_error = ApiError::from(error);

        // then (期待する結果):
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.message, "Participant 'ghost' not found");
    }

    #[test]
    fn test_snapshot_lists_publishers_only() {
        // テスト項目: ルーム一覧には publisher のみが並び、作成時刻は RFC 3339
        // given (前提条件):
        let mut room = Room::new("Lobby", 0);
        for (identity, can_publish) in [("bob", true), ("monitor", false), ("alice", true)] {
            let grant = Grant {
                token: format!("token-{}", identity),
                identity: identity.to_string(),
                room_name: "Lobby".to_string(),
                can_publish,
            };
            room.add_participant(Participant::new(&grant, 0)).unwrap();
        }
        room.recording = Some("EG_1".to_string());

        // when (操作):
        let snapshot = to_snapshot(&room);

        // then (期待する結果):
        assert_eq!(
            snapshot,
            RoomSnapshot {
                name: "Lobby".to_string(),
                participants: vec!["alice".to_string(), "bob".to_string()],
                recording: Some("EG_1".to_string()),
                created_at: "1970-01-01T00:00:00+00:00".to_string(),
            }
        );
    }

    #[test]
    fn test_recording_snapshot_includes_stop_time_and_duration() {
        // テスト項目: 停止済みの録音は停止時刻と秒単位の録音時間を持ち、録音中はどちらも空
        // given (前提条件):
        let stopped = Egress {
            egress_id: "EG_1".to_string(),
            room_name: "Lobby".to_string(),
            initiator: "admin".to_string(),
            started_at: 0,
            ended_at: Some(90_500),
        };
        let running = Egress {
            ended_at: None,
            ..stopped.clone()
        };

        // when (操作):
        let stopped_snapshot = to_recording_snapshot(&stopped);
        let running_snapshot = to_recording_snapshot(&running);

        // then (期待する結果):
        assert_eq!(
            stopped_snapshot,
            RecordingSnapshot {
                egress_id: "EG_1".to_string(),
                room_name: "Lobby".to_string(),
                initiator: "admin".to_string(),
                started_at: "1970-01-01T00:00:00+00:00".to_string(),
                ended_at: Some("1970-01-01T00:01:30.500+00:00".to_string()),
                duration_secs: Some(90),
            }
        );
        assert_eq!(running_snapshot.ended_at, None);
        assert_eq!(running_snapshot.duration_secs, None);
    }
}
