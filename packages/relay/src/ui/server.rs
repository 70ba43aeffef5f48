//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use switchboard_shared::time::{Clock, SystemClock};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    domain::{MessagePusher, RoomRepository},
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository},
    usecase::{
        IssueTokenUseCase, ListRoomsUseCase, RecordingUseCase, RoomCommandUseCase, SessionUseCase,
    },
};

use super::{
    handler::{
        get_recordings, get_rooms, health_check, issue_token, logout_all, logout_user, mute_all,
        rtc_handler, start_session_recording, stop_session_recording, unmute_all,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Loopback relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::in_memory();
/// server.run("127.0.0.1".to_string(), 4000).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Wire the use cases over a repository, a message pusher and a clock
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = AppState {
            issue_token_usecase: Arc::new(IssueTokenUseCase::new(repository.clone())),
            session_usecase: Arc::new(SessionUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            recording_usecase: Arc::new(RecordingUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock,
            )),
            room_command_usecase: Arc::new(RoomCommandUseCase::new(
                repository.clone(),
                message_pusher,
            )),
            list_rooms_usecase: Arc::new(ListRoomsUseCase::new(repository)),
        };
        Self {
            state: Arc::new(state),
        }
    }

    /// In-memory rooms, WebSocket signalling and the system clock
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(WebSocketMessagePusher::new()),
            Arc::new(SystemClock),
        )
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/rtc", get(rtc_handler))
            // HTTP エンドポイント
            .route("/token", post(issue_token))
            .route("/start-session-recording", post(start_session_recording))
            .route("/stop-session-recording", post(stop_session_recording))
            .route("/mute-all", post(mute_all))
            .route("/unmute-all", post(unmute_all))
            .route("/logout-all", post(logout_all))
            .route("/logout-user", post(logout_user))
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/recordings", get(get_recordings))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }

    /// Run the relay until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Switchboard relay listening on {}", local_addr);
        tracing::info!("Signalling endpoint: ws://{}/rtc", local_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
