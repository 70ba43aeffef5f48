//! Text rendering for the operator console.

use switchboard_shared::protocol::{RecordingSnapshot, RoomSnapshot};

use crate::{
    admin::AdminSession,
    broadcast::{ConnectionAttempt, ConnectionState},
    relay::{CommandKind, FanOutReport},
    speakers::SpeakingSet,
};

const RULE: &str = "============================================================";

/// Formatter for console output
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the active room list
    ///
    /// # Arguments
    ///
    /// * `rooms` - Room snapshots as returned by the relay
    ///
    /// # Returns
    ///
    /// A block with one line per room and its participants
    pub fn format_rooms(rooms: &[RoomSnapshot]) -> String {
        let mut output = String::new();
        output.push_str(RULE);
        output.push_str("\nActive rooms:\n");

        if rooms.is_empty() {
            output.push_str("(No active rooms)\n");
        } else {
            for room in rooms {
                let recording = match &room.recording {
                    Some(egress_id) => format!(" [recording {}]", egress_id),
                    None => String::new(),
                };
                output.push_str(&format!(
                    "{}{} - created at {}\n",
                    room.name, recording, room.created_at
                ));
                if room.participants.is_empty() {
                    output.push_str("    (nobody)\n");
                } else {
                    output.push_str(&format!("    {}\n", room.participants.join(", ")));
                }
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format the recording history, newest first as the relay returns it
    pub fn format_recordings(recordings: &[RecordingSnapshot]) -> String {
        let mut output = String::new();
        output.push_str(RULE);
        output.push_str("\nRecordings:\n");

        if recordings.is_empty() {
            output.push_str("(No recordings)\n");
        }
        for recording in recordings {
            output.push_str(&format!(
                "{} {} by {}\n",
                recording.egress_id, recording.room_name, recording.initiator
            ));
            match (&recording.ended_at, recording.duration_secs) {
                (Some(ended_at), Some(secs)) => output.push_str(&format!(
                    "    {} -> {} ({}m{:02}s)\n",
                    recording.started_at,
                    ended_at,
                    secs / 60,
                    secs % 60
                )),
                (Some(ended_at), None) => output.push_str(&format!(
                    "    {} -> {}\n",
                    recording.started_at, ended_at
                )),
                (None, _) => {
                    output.push_str(&format!("    {} -> (recording)\n", recording.started_at))
                }
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format the global speaking set, sorted
    pub fn format_speaking(speaking: &SpeakingSet) -> String {
        if speaking.is_empty() {
            return "Speaking: (silence)\n".to_string();
        }
        let mut names: Vec<&str> = speaking.iter().map(String::as_str).collect();
        names.sort_unstable();
        format!("Speaking: {}\n", names.join(", "))
    }

    /// Format a broadcast panel transition
    pub fn format_state(attempt: &ConnectionAttempt) -> String {
        match attempt.state {
            ConnectionState::Connecting | ConnectionState::Reconnecting
                if attempt.attempt_number > 0 =>
            {
                format!(
                    "[{}] attempt {} in {:.1}s\n",
                    attempt.state,
                    attempt.attempt_number,
                    attempt.scheduled_delay.as_secs_f64()
                )
            }
            ConnectionState::Failed => {
                format!("[{}] giving up, type 'retry' to try again\n", attempt.state)
            }
            _ => format!("[{}]\n", attempt.state),
        }
    }

    /// Format the outcome of a room command sent to several rooms
    pub fn format_fan_out(kind: CommandKind, report: &FanOutReport) -> String {
        let mut output = String::new();
        for room in &report.succeeded {
            output.push_str(&format!("✓ {} {}\n", kind, room));
        }
        for (room, error) in &report.failed {
            output.push_str(&format!("✗ {} {}: {}\n", kind, room, error));
        }
        if report.succeeded.is_empty() && report.failed.is_empty() {
            output.push_str(&format!("{}: no active rooms\n", kind));
        }
        output
    }

    /// Format the logged-in operator and their capabilities
    pub fn format_whoami(session: &AdminSession) -> String {
        let capabilities: Vec<String> = session
            .capabilities()
            .sorted()
            .iter()
            .map(ToString::to_string)
            .collect();
        let capabilities = if capabilities.is_empty() {
            "(none)".to_string()
        } else {
            capabilities.join(", ")
        };
        format!(
            "{} ({}) - {}\ncapabilities: {}\n",
            session.username, session.full_name, session.role, capabilities
        )
    }
}
