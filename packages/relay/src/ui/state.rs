//! Shared application state.

use std::sync::Arc;

use crate::usecase::{
    IssueTokenUseCase, ListRoomsUseCase, RecordingUseCase, RoomCommandUseCase, SessionUseCase,
};

/// Shared application state
pub struct AppState {
    /// トークン発行
    pub issue_token_usecase: Arc<IssueTokenUseCase>,
    /// `/rtc` セッション
    pub session_usecase: Arc<SessionUseCase>,
    /// 録音の開始・停止
    pub recording_usecase: Arc<RecordingUseCase>,
    /// mute-all / logout-all など
    pub room_command_usecase: Arc<RoomCommandUseCase>,
    /// ルーム一覧
    pub list_rooms_usecase: Arc<ListRoomsUseCase>,
}
