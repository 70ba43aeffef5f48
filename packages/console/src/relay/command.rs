//! Room commands and their fan-out over several rooms.

use std::fmt;

use crate::error::RelayError;

use super::RelayApi;

/// Command kinds that apply to a whole room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    MuteAll,
    UnmuteAll,
    LogoutAll,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::MuteAll => "mute-all",
            CommandKind::UnmuteAll => "unmute-all",
            CommandKind::LogoutAll => "logout-all",
        };
        f.write_str(name)
    }
}

/// A command forwarded by the relay to the media service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCommand {
    MuteAll { room_name: String },
    UnmuteAll { room_name: String },
    LogoutAll { room_name: String },
    LogoutUser { room_name: String, identity: String },
}

impl RoomCommand {
    /// Build a room-wide command of the given kind
    pub fn for_room(kind: CommandKind, room_name: impl Into<String>) -> Self {
        let room_name = room_name.into();
        match kind {
            CommandKind::MuteAll => RoomCommand::MuteAll { room_name },
            CommandKind::UnmuteAll => RoomCommand::UnmuteAll { room_name },
            CommandKind::LogoutAll => RoomCommand::LogoutAll { room_name },
        }
    }

    /// Relay endpoint path for this command
    pub fn path(&self) -> &'static str {
        match self {
            RoomCommand::MuteAll { .. } => "/mute-all",
            RoomCommand::UnmuteAll { .. } => "/unmute-all",
            RoomCommand::LogoutAll { .. } => "/logout-all",
            RoomCommand::LogoutUser { .. } => "/logout-user",
        }
    }

    pub fn room_name(&self) -> &str {
        match self {
            RoomCommand::MuteAll { room_name }
            | RoomCommand::UnmuteAll { room_name }
            | RoomCommand::LogoutAll { room_name }
            | RoomCommand::LogoutUser { room_name, .. } => room_name,
        }
    }
}

/// Outcome of a command sent to several rooms
#[derive(Debug, Default)]
pub struct FanOutReport {
    /// Rooms that acknowledged the command
    pub succeeded: Vec<String>,
    /// Rooms that failed, with the reason
    pub failed: Vec<(String, RelayError)>,
}

impl FanOutReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Send one command kind to every room in `rooms`, in order.
///
/// A failure in one room does not stop the others.
pub async fn fan_out(relay: &dyn RelayApi, kind: CommandKind, rooms: &[String]) -> FanOutReport {
    let mut report = FanOutReport::default();

    for room in rooms {
        match relay.send_room_command(RoomCommand::for_room(kind, room.as_str())).await {
            Ok(()) => {
                tracing::info!("{} sent to room '{}'", kind, room);
                report.succeeded.push(room.clone());
            }
            Err(e) => {
                tracing::warn!("{} failed for room '{}': {}", kind, room, e);
                report.failed.push((room.clone(), e));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::MockRelayApi;

    #[test]
    fn test_room_command_paths() {
        // テスト項目: 各コマンドが対応するエンドポイントに送られる
        // given (前提条件):
        let commands = [
            RoomCommand::for_room(CommandKind::MuteAll, "Lobby"),
            RoomCommand::for_room(CommandKind::UnmuteAll, "Lobby"),
            RoomCommand::for_room(CommandKind::LogoutAll, "Lobby"),
            RoomCommand::LogoutUser {
                room_name: "Lobby".to_string(),
                identity: "alice".to_string(),
            },
        ];

        // when (操作):
        let paths: Vec<&str> = commands.iter().map(|c| c.path()).collect();

        // then (期待する結果):
        assert_eq!(paths, vec!["/mute-all", "/unmute-all", "/logout-all", "/logout-user"]);
        assert!(commands.iter().all(|c| c.room_name() == "Lobby"));
    }

    #[tokio::test]
    async fn test_fan_out_continues_past_failures() {
        // テスト項目: 一部のルームで失敗しても残りのルームにコマンドが送られる
        // given (前提条件):
        let mut relay = MockRelayApi::new();
        relay
            .expect_send_room_command()
            .times(3)
            .returning(|command| match command.room_name() {
                "B" => Err(RelayError::Rejected {
                    status: 404,
                    message: "room not found".to_string(),
                }),
                _ => Ok(()),
            });
        let rooms = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        // when (操作):
        let report = fan_out(&relay, CommandKind::MuteAll, &rooms).await;

        // then (期待する結果):
        assert_eq!(report.succeeded, vec!["A".to_string(), "C".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "B");
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_fan_out_with_no_rooms_sends_nothing() {
        // テスト項目: ルームが無い場合は何も送信せず完了扱いになる
        // given (前提条件):
        let relay = MockRelayApi::new();

        // when (操作):
        let report = fan_out(&relay, CommandKind::LogoutAll, &[]).await;

        // then (期待する結果):
        assert!(report.succeeded.is_empty());
        assert!(report.is_complete());
    }
}
