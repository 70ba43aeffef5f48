//! UseCase 層
//!
//! Domain 層の trait だけに依存し、HTTP / WebSocket のハンドラから呼ばれる。

mod error;
mod issue_token;
mod list_rooms;
mod recording;
mod room_command;
mod session;
mod signal;

pub use error::{JoinError, RecordingError, RoomCommandError, TokenError};
pub use issue_token::IssueTokenUseCase;
pub use list_rooms::ListRoomsUseCase;
pub use recording::RecordingUseCase;
pub use room_command::{LOGGED_OUT, RoomCommandUseCase};
pub use session::{JoinedSession, SessionUseCase};
pub use signal::ROOM_CLOSED;
