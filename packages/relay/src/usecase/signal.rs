//! UseCase 共通: シグナルの送信
//!
//! アクティブスピーカーの通知やルーム終了の通知など、複数のユースケースから
//! 使われる送信処理をまとめる。

use switchboard_shared::protocol::ServerSignal;

use crate::domain::{MessagePusher, RepositoryError, Room, RoomRepository, RoomUpdate, SessionKey};

/// ルームが閉じられたときに残りの参加者へ送る理由
pub const ROOM_CLOSED: &str = "room closed";

/// ルームの全参加者のセッションキー
pub(crate) fn members_of(room: &Room) -> Vec<SessionKey> {
    room.participants
        .iter()
        .map(|p| SessionKey::new(room.name.clone(), p.identity.clone()))
        .collect()
}

/// シグナルを JSON にして複数セッションへ送る
pub(crate) async fn push_signal(
    pusher: &dyn MessagePusher,
    targets: Vec<SessionKey>,
    signal: &ServerSignal,
) {
    if targets.is_empty() {
        return;
    }
    match serde_json::to_string(signal) {
        Ok(json) => pusher.broadcast(targets, &json).await,
        Err(e) => tracing::error!("Failed to encode signal {:?}: {}", signal, e),
    }
}

/// アクティブスピーカーが変わっていれば全参加者へ通知する
pub(crate) async fn announce_speakers(pusher: &dyn MessagePusher, update: &RoomUpdate) {
    if !update.speakers_changed {
        return;
    }
    let speakers = update.room.active_speakers();
    tracing::debug!("Active speakers in '{}': {:?}", update.room.name, speakers);
    push_signal(
        pusher,
        members_of(&update.room),
        &ServerSignal::ActiveSpeakers {
            identities: speakers,
        },
    )
    .await;
}

/// 参加者を切り離す（Removed を送ってから登録を解除）
pub(crate) async fn remove_session(pusher: &dyn MessagePusher, key: SessionKey, reason: &str) {
    push_signal(
        pusher,
        vec![key.clone()],
        &ServerSignal::Removed {
            reason: reason.to_string(),
        },
    )
    .await;
    pusher.unregister_client(&key, None).await;
}

/// アイドルなルームを閉じ、残っている参加者を切り離す
///
/// ルームが既に無い場合は何もしない
pub(crate) async fn close_if_idle(
    repository: &dyn RoomRepository,
    pusher: &dyn MessagePusher,
    room_name: &str,
) {
    let closed = match repository.delete_room_if_idle(room_name).await {
        Ok(Some(room)) => room,
        Ok(None) | Err(RepositoryError::RoomNotFound(_)) => return,
        Err(e) => {
            tracing::warn!("Failed to close room '{}': {}", room_name, e);
            return;
        }
    };

    for key in members_of(&closed) {
        remove_session(pusher, key, ROOM_CLOSED).await;
    }
}
