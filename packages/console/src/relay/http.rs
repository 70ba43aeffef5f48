//! reqwest implementation of [`RelayApi`].

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Serialize, de::DeserializeOwned};
use switchboard_shared::protocol::{
    Ack, ErrorBody, LogoutUserRequest, RecordingSnapshot, RoomRequest, RoomSnapshot,
    StartRecordingRequest, StartRecordingResponse, StopRecordingRequest, TokenRequest,
    TokenResponse,
};

use crate::error::RelayError;

use super::{RelayApi, RoomCommand};

/// HTTP client for the relay
#[derive(Debug, Clone)]
pub struct HttpRelayClient {
    base_url: String,
    http: Client,
}

impl HttpRelayClient {
    /// Create a client for the relay at `base_url` (e.g. `http://127.0.0.1:4000`)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, RelayError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| RelayError::Unreachable(e.to_string()))?;
        decode(response).await
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, RelayError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| RelayError::Unreachable(e.to_string()))?;
        decode(response).await
    }
}

/// Map a relay response to its body or a typed error
async fn decode<R: DeserializeOwned>(response: Response) -> Result<R, RelayError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        return Err(RelayError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<R>()
        .await
        .map_err(|e| RelayError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl RelayApi for HttpRelayClient {
    async fn fetch_token(&self, request: TokenRequest) -> Result<String, RelayError> {
        let response: TokenResponse = self.post("/token", &request).await?;
        Ok(response.token)
    }

    async fn start_recording(
        &self,
        room_name: String,
        initiator: String,
    ) -> Result<String, RelayError> {
        let request = StartRecordingRequest {
            room_name,
            initiator,
        };
        let response: StartRecordingResponse =
            self.post("/start-session-recording", &request).await?;
        Ok(response.egress_id)
    }

    async fn stop_recording(&self, egress_id: String) -> Result<(), RelayError> {
        let _: Ack = self
            .post("/stop-session-recording", &StopRecordingRequest { egress_id })
            .await?;
        Ok(())
    }

    async fn send_room_command(&self, command: RoomCommand) -> Result<(), RelayError> {
        let path = command.path();
        let _: Ack = match command {
            RoomCommand::MuteAll { room_name }
            | RoomCommand::UnmuteAll { room_name }
            | RoomCommand::LogoutAll { room_name } => {
                self.post(path, &RoomRequest { room_name }).await?
            }
            RoomCommand::LogoutUser {
                room_name,
                identity,
            } => {
                self.post(
                    path,
                    &LogoutUserRequest {
                        room_name,
                        identity,
                    },
                )
                .await?
            }
        };
        Ok(())
    }

    async fn list_rooms(&self) -> Result<Vec<RoomSnapshot>, RelayError> {
        self.get("/api/rooms").await
    }

    async fn list_recordings(&self) -> Result<Vec<RecordingSnapshot>, RelayError> {
        self.get("/api/recordings").await
    }
}
