//! ドメイン層
//!
//! ルーム・参加者・トークンのモデルと、UseCase 層が依存するインターフェース。

mod error;
mod model;
mod pusher;
mod repository;

pub use error::{MessagePushError, RepositoryError};
pub use model::{Egress, Grant, Participant, Room, RoomUpdate};
#[cfg(test)]
pub use pusher::MockMessagePusher;
pub use pusher::{MessagePusher, PusherChannel, SessionKey};
#[cfg(test)]
pub use repository::MockRoomRepository;
pub use repository::RoomRepository;
