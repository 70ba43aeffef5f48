//! Merges per-room active speakers into one "currently speaking" set.
//!
//! Each room's entry is written only through its [`RoomSpeakerHandle`]; the
//! global set is recomputed under the same lock on every change, so it is
//! always the exact union of the current room entries.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use tokio::sync::watch;

/// Identities currently speaking
pub type SpeakingSet = HashSet<String>;

pub struct SpeakerAggregator {
    rooms: Mutex<HashMap<String, SpeakingSet>>,
    global: watch::Sender<SpeakingSet>,
}

impl SpeakerAggregator {
    pub fn new() -> Arc<Self> {
        let (global, _) = watch::channel(SpeakingSet::new());
        Arc::new(Self {
            rooms: Mutex::new(HashMap::new()),
            global,
        })
    }

    /// Writer for `room_name`'s entry.
    ///
    /// The caller is responsible for handing out one handle per room.
    pub fn handle(self: &Arc<Self>, room_name: impl Into<String>) -> RoomSpeakerHandle {
        RoomSpeakerHandle {
            room_name: room_name.into(),
            aggregator: Arc::clone(self),
        }
    }

    /// Receiver that observes every recomputation of the global set
    pub fn subscribe(&self) -> watch::Receiver<SpeakingSet> {
        self.global.subscribe()
    }

    /// Snapshot of the global set
    pub fn speaking(&self) -> SpeakingSet {
        self.global.borrow().clone()
    }

    pub fn is_speaking(&self, identity: &str) -> bool {
        self.global.borrow().contains(identity)
    }

    /// Current entry of one room, if it has one
    pub fn room_speakers(&self, room_name: &str) -> Option<SpeakingSet> {
        self.lock_rooms().get(room_name).cloned()
    }

    /// Rooms that currently have an entry, sorted
    pub fn rooms(&self) -> Vec<String> {
        let mut rooms: Vec<String> = self.lock_rooms().keys().cloned().collect();
        rooms.sort();
        rooms
    }

    fn replace(&self, room_name: &str, identities: SpeakingSet) {
        let mut rooms = self.lock_rooms();
        rooms.insert(room_name.to_string(), identities);
        self.recompute(&rooms);
    }

    fn remove(&self, room_name: &str) {
        let mut rooms = self.lock_rooms();
        if rooms.remove(room_name).is_some() {
            self.recompute(&rooms);
        }
    }

    fn recompute(&self, rooms: &HashMap<String, SpeakingSet>) {
        let union: SpeakingSet = rooms.values().flatten().cloned().collect();
        self.global.send_if_modified(|current| {
            if *current == union {
                false
            } else {
                *current = union;
                true
            }
        });
    }

    fn lock_rooms(&self) -> MutexGuard<'_, HashMap<String, SpeakingSet>> {
        self.rooms.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Exclusive writer for one room's speaker entry
pub struct RoomSpeakerHandle {
    room_name: String,
    aggregator: Arc<SpeakerAggregator>,
}

impl RoomSpeakerHandle {
    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    /// Replace this room's entry with the reported identities
    pub fn replace<I>(&self, identities: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.aggregator
            .replace(&self.room_name, identities.into_iter().collect());
    }

    /// Drop this room's entry entirely
    pub fn clear(&self) {
        self.aggregator.remove(&self.room_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(identities: &[&str]) -> SpeakingSet {
        identities.iter().map(|s| s.to_string()).collect()
    }

    fn names(identities: &[&str]) -> Vec<String> {
        identities.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_union_across_rooms_and_update() {
        // テスト項目: 複数ルームの話者の和集合になり、ルーム A の更新後も正確な和集合を保つ
        // given (前提条件):
        let aggregator = SpeakerAggregator::new();
        let room_a = aggregator.handle("A");
        let room_b = aggregator.handle("B");

        // when (操作):
        room_a.replace(names(&["alice"]));
        room_b.replace(names(&["bob", "carol"]));
        let both = aggregator.speaking();
        room_a.replace(Vec::new());

        // then (期待する結果):
        assert_eq!(both, set(&["alice", "bob", "carol"]));
        assert_eq!(aggregator.speaking(), set(&["bob", "carol"]));
        assert!(!aggregator.is_speaking("alice"));
        assert!(aggregator.is_speaking("carol"));
    }

    #[test]
    fn test_clear_removes_only_that_room() {
        // テスト項目: 1 ルームのエントリ削除はそのキーのみを消し、全体集合からその話者を除く
        // given (前提条件):
        let aggregator = SpeakerAggregator::new();
        let room_a = aggregator.handle("A");
        let room_b = aggregator.handle("B");
        room_a.replace(names(&["alice"]));
        room_b.replace(names(&["bob"]));

        // when (操作):
        room_a.clear();

        // then (期待する結果):
        assert_eq!(aggregator.rooms(), vec!["B".to_string()]);
        assert_eq!(aggregator.room_speakers("B"), Some(set(&["bob"])));
        assert_eq!(aggregator.speaking(), set(&["bob"]));
    }

    #[test]
    fn test_identity_speaking_in_two_rooms_stays_until_both_clear() {
        // テスト項目: 同じ identity が 2 ルームで話している場合、両方が消えるまで話者のまま
        // given (前提条件):
        let aggregator = SpeakerAggregator::new();
        let room_a = aggregator.handle("A");
        let room_b = aggregator.handle("B");
        room_a.replace(names(&["alice"]));
        room_b.replace(names(&["alice"]));

        // when (操作):
        room_a.replace(Vec::new());

        // then (期待する結果):
        assert!(aggregator.is_speaking("alice"));
        room_b.clear();
        assert!(!aggregator.is_speaking("alice"));
    }

    #[tokio::test]
    async fn test_subscribers_see_recomputed_set() {
        // テスト項目: 購読者は再計算された全体集合を受け取る
        // given (前提条件):
        let aggregator = SpeakerAggregator::new();
        let mut rx = aggregator.subscribe();
        let room_a = aggregator.handle("A");

        // when (操作):
        room_a.replace(names(&["alice"]));
        rx.changed().await.unwrap();

        // then (期待する結果):
        assert_eq!(*rx.borrow_and_update(), set(&["alice"]));
    }

    #[test]
    fn test_unchanged_union_does_not_notify() {
        // テスト項目: 和集合が変わらない更新では購読者に通知しない
        // given (前提条件):
        let aggregator = SpeakerAggregator::new();
        let room_a = aggregator.handle("A");
        room_a.replace(names(&["alice"]));
        let rx = aggregator.subscribe();

        // when (操作):
        room_a.replace(names(&["alice"]));

        // then (期待する結果):
        assert!(!rx.has_changed().unwrap());
    }
}
