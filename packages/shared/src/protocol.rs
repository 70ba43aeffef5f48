//! Wire types shared by the console and the relay.
//!
//! HTTP bodies use camelCase field names. Signalling messages on the `/rtc`
//! WebSocket are JSON objects tagged by a kebab-case `type` field.

use serde::{Deserialize, Serialize};

// ========================================
// HTTP: token / recording / room commands
// ========================================

/// `POST /token` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    /// Participant identity the token is issued for
    #[serde(alias = "username")]
    pub identity: String,
    /// Target room
    pub room_name: String,
    /// `false` issues a listen-only grant
    #[serde(default = "default_can_publish")]
    pub can_publish: bool,
}

fn default_can_publish() -> bool {
    true
}

impl TokenRequest {
    /// Token request for a participant that may publish audio
    pub fn publisher(identity: impl Into<String>, room_name: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            room_name: room_name.into(),
            can_publish: true,
        }
    }

    /// Token request for a listen-only participant
    pub fn listener(identity: impl Into<String>, room_name: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            room_name: room_name.into(),
            can_publish: false,
        }
    }
}

/// `POST /token` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// `POST /start-session-recording` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingRequest {
    pub room_name: String,
    pub initiator: String,
}

/// `POST /start-session-recording` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingResponse {
    pub egress_id: String,
}

/// `POST /stop-session-recording` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRecordingRequest {
    pub egress_id: String,
}

/// `POST /mute-all`, `/unmute-all`, `/logout-all` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    pub room_name: String,
}

/// `POST /logout-user` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutUserRequest {
    pub room_name: String,
    pub identity: String,
}

/// Acknowledgement body returned by command endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

/// Error body returned by the relay on non-2xx responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// One entry of `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub name: String,
    /// Publishing participants currently connected, sorted
    pub participants: Vec<String>,
    /// Egress id of the running recording, if any
    pub recording: Option<String>,
    /// RFC 3339
    pub created_at: String,
}

/// One entry of `GET /api/recordings`, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSnapshot {
    pub egress_id: String,
    pub room_name: String,
    pub initiator: String,
    /// RFC 3339
    pub started_at: String,
    /// RFC 3339, `None` while still recording
    pub ended_at: Option<String>,
    pub duration_secs: Option<i64>,
}

// ========================================
// WebSocket: signalling
// ========================================

/// Messages pushed by the relay to a media session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerSignal {
    /// Sent once after the session is accepted
    Joined {
        room: String,
        identity: String,
        participants: Vec<String>,
    },
    /// The room's active speaker set changed
    ActiveSpeakers { identities: Vec<String> },
    /// The relay changed this participant's microphone (mute-all / unmute-all)
    Microphone { enabled: bool },
    /// The participant was removed from the room; the session must not reconnect
    Removed { reason: String },
}

/// Messages sent by a media session to the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientSignal {
    /// Voice activity of the local participant
    Speaking { active: bool },
    /// Local microphone toggle
    Microphone { enabled: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_request_accepts_username_alias() {
        // テスト項目: identity の代わりに username を受け付け、can_publish の既定値は true
        // given (前提条件):
        let json = r#"{"username":"admin","roomName":"Lobby"}"#;

        // when (操作):
        let request: TokenRequest = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(request, TokenRequest::publisher("admin", "Lobby"));
    }

    #[test]
    fn test_listener_token_request_serializes_camel_case() {
        // テスト項目: リスナー用トークン要求が camelCase で出力される
        // given (前提条件):
        let request = TokenRequest::listener("admin-monitor-lobby-1a2b3c4d", "Lobby");

        // when (操作):
        let json = serde_json::to_value(&request).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({
                "identity": "admin-monitor-lobby-1a2b3c4d",
                "roomName": "Lobby",
                "canPublish": false,
            })
        );
    }

    #[test]
    fn test_server_signal_is_tagged_by_type() {
        // テスト項目: シグナルメッセージが type タグ付きで表現される
        // given (前提条件):
        let signal = ServerSignal::ActiveSpeakers {
            identities: vec!["alice".to_string()],
        };

        // when (操作):
        let json = serde_json::to_string(&signal).unwrap();

        // then (期待する結果):
        assert_eq!(json, r#"{"type":"active-speakers","identities":["alice"]}"#);
    }

    #[test]
    fn test_client_signal_parses_speaking() {
        // テスト項目: クライアントからの speaking メッセージを解析できる
        // given (前提条件):
        let json = r#"{"type":"speaking","active":true}"#;

        // when (操作):
        let signal: ClientSignal = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(signal, ClientSignal::Speaking { active: true });
    }
}
