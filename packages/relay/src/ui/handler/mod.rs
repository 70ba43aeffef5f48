//! Request handlers.

mod http;
mod websocket;

pub use http::{
    get_recordings, get_rooms, health_check, issue_token, logout_all, logout_user, mute_all,
    start_session_recording, stop_session_recording, unmute_all,
};
pub use websocket::rtc_handler;
