//! メッセージ送信（通知）の実装
//!
//! - `websocket`: WebSocket セッションへの送信

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
