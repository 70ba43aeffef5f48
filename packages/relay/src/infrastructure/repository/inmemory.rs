//! InMemory Room Repository 実装
//!
//! ルーム・トークン・egress を 1 つの Mutex の下に保持する。
//! 各操作はロックを取ったまま完結するため、同じルームへの更新が失われない。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    Egress, Grant, Participant, RepositoryError, Room, RoomRepository, RoomUpdate,
};

#[derive(Debug, Default)]
struct Store {
    rooms: HashMap<String, Room>,
    /// token -> Grant
    grants: HashMap<String, Grant>,
    /// egress_id -> 録音の記録（停止後も履歴として残す）
    egresses: HashMap<String, Egress>,
}

impl Store {
    /// ルームを更新し、アクティブスピーカーの変化を記録する
    fn update<R>(
        &mut self,
        room_name: &str,
        f: impl FnOnce(&mut Room) -> Result<R, RepositoryError>,
    ) -> Result<(R, RoomUpdate), RepositoryError> {
        let room = self
            .rooms
            .get_mut(room_name)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_name.to_string()))?;
        let before = room.active_speakers();
        let value = f(room)?;
        let speakers_changed = room.active_speakers() != before;
        Ok((
            value,
            RoomUpdate {
                room: room.clone(),
                speakers_changed,
            },
        ))
    }
}

/// インメモリ Room Repository 実装
#[derive(Debug, Default)]
pub struct InMemoryRoomRepository {
    store: Mutex<Store>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn issue_grant(&self, grant: Grant) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        store.grants.retain(|_, issued| {
            issued.identity != grant.identity || issued.room_name != grant.room_name
        });
        store.grants.insert(grant.token.clone(), grant);
        Ok(())
    }

    async fn find_grant(&self, token: &str) -> Option<Grant> {
        let store = self.store.lock().await;
        store.grants.get(token).cloned()
    }

    async fn add_participant(
        &self,
        room_name: &str,
        participant: Participant,
    ) -> Result<RoomUpdate, RepositoryError> {
        let mut store = self.store.lock().await;
        if participant.can_publish && !store.rooms.contains_key(room_name) {
            tracing::info!("Room '{}' created", room_name);
            store
                .rooms
                .insert(room_name.to_string(), Room::new(room_name, participant.joined_at));
        }
        let ((), update) = store.update(room_name, |room| room.add_participant(participant))?;
        Ok(update)
    }

    async fn remove_participant(
        &self,
        room_name: &str,
        identity: &str,
        connection_id: Option<Uuid>,
    ) -> Result<(Participant, RoomUpdate), RepositoryError> {
        let mut store = self.store.lock().await;
        store.update(room_name, |room| {
            room.remove_participant(identity, connection_id)
                .ok_or_else(|| RepositoryError::ParticipantNotFound(identity.to_string()))
        })
    }

    async fn set_speaking(
        &self,
        room_name: &str,
        identity: &str,
        speaking: bool,
    ) -> Result<RoomUpdate, RepositoryError> {
        let mut store = self.store.lock().await;
        let ((), update) = store.update(room_name, |room| {
            let participant = room
                .participant_mut(identity)
                .ok_or_else(|| RepositoryError::ParticipantNotFound(identity.to_string()))?;
            participant.speaking = speaking;
            Ok(())
        })?;
        Ok(update)
    }

    async fn set_microphone(
        &self,
        room_name: &str,
        identity: &str,
        enabled: bool,
    ) -> Result<RoomUpdate, RepositoryError> {
        let mut store = self.store.lock().await;
        let ((), update) = store.update(room_name, |room| {
            let participant = room
                .participant_mut(identity)
                .ok_or_else(|| RepositoryError::ParticipantNotFound(identity.to_string()))?;
            participant.microphone_enabled = enabled && participant.can_publish;
            Ok(())
        })?;
        Ok(update)
    }

    async fn set_all_microphones(
        &self,
        room_name: &str,
        enabled: bool,
    ) -> Result<(Vec<String>, RoomUpdate), RepositoryError> {
        let mut store = self.store.lock().await;
        store.update(room_name, |room| {
            let mut affected = Vec::new();
            for participant in room.participants.iter_mut().filter(|p| p.can_publish) {
                participant.microphone_enabled = enabled;
                affected.push(participant.identity.clone());
            }
            affected.sort();
            Ok(affected)
        })
    }

    async fn remove_publishers(
        &self,
        room_name: &str,
    ) -> Result<(Vec<Participant>, RoomUpdate), RepositoryError> {
        let mut store = self.store.lock().await;
        store.update(room_name, |room| {
            let (removed, kept): (Vec<Participant>, Vec<Participant>) = room
                .participants
                .drain(..)
                .partition(|p| p.can_publish);
            room.participants = kept;
            Ok(removed)
        })
    }

    async fn delete_room_if_idle(&self, room_name: &str) -> Result<Option<Room>, RepositoryError> {
        let mut store = self.store.lock().await;
        let idle = store
            .rooms
            .get(room_name)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_name.to_string()))?
            .is_idle();
        if !idle {
            return Ok(None);
        }

        let room = store.rooms.remove(room_name);
        store.grants.retain(|_, grant| grant.room_name != room_name);
        tracing::info!("Room '{}' closed", room_name);
        Ok(room)
    }

    async fn get_room(&self, room_name: &str) -> Result<Room, RepositoryError> {
        let store = self.store.lock().await;
        store
            .rooms
            .get(room_name)
            .cloned()
            .ok_or_else(|| RepositoryError::RoomNotFound(room_name.to_string()))
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let store = self.store.lock().await;
        let mut rooms: Vec<Room> = store.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        rooms
    }

    async fn start_recording(&self, egress: Egress) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        let room = store
            .rooms
            .get_mut(&egress.room_name)
            .ok_or_else(|| RepositoryError::RoomNotFound(egress.room_name.clone()))?;
        if let Some(current) = &room.recording {
            return Err(RepositoryError::AlreadyRecording {
                room: egress.room_name.clone(),
                egress_id: current.clone(),
            });
        }
        room.recording = Some(egress.egress_id.clone());
        store.egresses.insert(egress.egress_id.clone(), egress);
        Ok(())
    }

    async fn stop_recording(&self, egress_id: &str, now: i64) -> Result<Egress, RepositoryError> {
        let mut store = self.store.lock().await;
        let egress = store
            .egresses
            .get_mut(egress_id)
            .filter(|egress| egress.is_active())
            .ok_or_else(|| RepositoryError::EgressNotFound(egress_id.to_string()))?;
        egress.ended_at = Some(now);
        let stopped = egress.clone();
        if let Some(room) = store.rooms.get_mut(&stopped.room_name)
            && room.recording.as_deref() == Some(egress_id)
        {
            room.recording = None;
        }
        Ok(stopped)
    }

    async fn list_recordings(&self) -> Vec<Egress> {
        let store = self.store.lock().await;
        let mut egresses: Vec<Egress> = store.egresses.values().cloned().collect();
        egresses.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| a.egress_id.cmp(&b.egress_id))
        });
        egresses
    }
}
