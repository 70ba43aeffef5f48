//! ルームと参加者のドメインモデル

use uuid::Uuid;

use super::error::RepositoryError;

/// トークンに紐づく参加権限
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub token: String,
    pub identity: String,
    pub room_name: String,
    /// `false` なら音声を publish できない（監視用）
    pub can_publish: bool,
}

/// ルームに接続中の参加者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub identity: String,
    /// 同じ identity の再接続と区別するための接続 ID
    pub connection_id: Uuid,
    pub can_publish: bool,
    pub microphone_enabled: bool,
    pub speaking: bool,
    pub joined_at: i64,
}

impl Participant {
    pub fn new(grant: &Grant, joined_at: i64) -> Self {
        Self {
            identity: grant.identity.clone(),
            connection_id: Uuid::new_v4(),
            can_publish: grant.can_publish,
            microphone_enabled: grant.can_publish,
            speaking: false,
            joined_at,
        }
    }

    /// アクティブスピーカーとして扱うか
    pub fn is_active_speaker(&self) -> bool {
        self.can_publish && self.microphone_enabled && self.speaking
    }
}

/// ルーム（集約ルート）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub name: String,
    pub created_at: i64,
    pub participants: Vec<Participant>,
    /// 録音中の egress ID
    pub recording: Option<String>,
}

impl Room {
    pub fn new(name: impl Into<String>, created_at: i64) -> Self {
        Self {
            name: name.into(),
            created_at,
            participants: Vec::new(),
            recording: None,
        }
    }

    /// 参加者を追加（同じ identity が接続中ならエラー）
    pub fn add_participant(&mut self, participant: Participant) -> Result<(), RepositoryError> {
        if self.participant(&participant.identity).is_some() {
            return Err(RepositoryError::DuplicateIdentity(participant.identity));
        }
        self.participants.push(participant);
        Ok(())
    }

    /// 参加者を削除
    ///
    /// `connection_id` を指定した場合、その接続のときだけ削除する
    pub fn remove_participant(
        &mut self,
        identity: &str,
        connection_id: Option<Uuid>,
    ) -> Option<Participant> {
        let index = self.participants.iter().position(|p| {
            p.identity == identity && connection_id.is_none_or(|id| p.connection_id == id)
        })?;
        Some(self.participants.remove(index))
    }

    pub fn participant(&self, identity: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.identity == identity)
    }

    pub fn participant_mut(&mut self, identity: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.identity == identity)
    }

    /// 話している publisher の identity（ソート済み）
    pub fn active_speakers(&self) -> Vec<String> {
        let mut speakers: Vec<String> = self
            .participants
            .iter()
            .filter(|p| p.is_active_speaker())
            .map(|p| p.identity.clone())
            .collect();
        speakers.sort();
        speakers
    }

    /// publish 可能な参加者の identity（ソート済み）
    pub fn publishers(&self) -> Vec<String> {
        let mut publishers: Vec<String> = self
            .participants
            .iter()
            .filter(|p| p.can_publish)
            .map(|p| p.identity.clone())
            .collect();
        publishers.sort();
        publishers
    }

    /// 全参加者の identity
    pub fn members(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.identity.clone()).collect()
    }

    /// publisher がおらず録音もしていない
    pub fn is_idle(&self) -> bool {
        self.recording.is_none() && self.participants.iter().all(|p| !p.can_publish)
    }
}

/// 録音（egress）の記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Egress {
    pub egress_id: String,
    pub room_name: String,
    /// 録音を開始した operator
    pub initiator: String,
    pub started_at: i64,
    /// 停止済みなら停止時刻
    pub ended_at: Option<i64>,
}

impl Egress {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// 録音時間（ミリ秒）。録音中は `None`
    pub fn duration_millis(&self) -> Option<i64> {
        self.ended_at.map(|ended| (ended - self.started_at).max(0))
    }
}

/// ルーム更新の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomUpdate {
    /// 更新後のルーム
    pub room: Room,
    /// アクティブスピーカーの集合が変わったか
    pub speakers_changed: bool,
}
