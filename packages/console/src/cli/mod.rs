//! `switchboard` command line.

mod broadcast;
mod formatter;
mod prompt;

pub use formatter::ConsoleFormatter;
pub use prompt::PromptCommand;

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use crate::{
    admin::{AdminSession, Capability, Role},
    error::{ConsoleError, RelayError},
    media::SignalTransport,
    reconcile::{DEFAULT_POLL_INTERVAL, clamp_poll_interval, run_reconciler},
    relay::{CommandKind, HttpRelayClient, RelayApi, RoomCommand, fan_out},
    speakers::MonitorPool,
};

pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:4000";
pub const DEFAULT_SESSION_FILE: &str = ".switchboard/session.json";

#[derive(Parser, Debug)]
#[command(name = "switchboard")]
#[command(about = "Operator console for voice rooms: broadcast, monitor speakers, record and moderate", long_about = None)]
pub struct Args {
    /// Base URL of the relay
    #[arg(long, global = true, env = "SWITCHBOARD_RELAY_URL", default_value = DEFAULT_RELAY_URL)]
    pub relay_url: String,

    /// Media signalling endpoint (derived from the relay URL when omitted)
    #[arg(long, global = true, env = "SWITCHBOARD_MEDIA_URL")]
    pub media_url: Option<String>,

    /// Stored admin session
    #[arg(long, global = true, env = "SWITCHBOARD_SESSION", default_value = DEFAULT_SESSION_FILE)]
    pub session_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Join a room as a broadcaster and control it from a prompt
    Broadcast {
        /// Room to broadcast into
        #[arg(short, long)]
        room: String,

        /// Identity to publish as (defaults to the session's username)
        #[arg(short, long)]
        identity: Option<String>,
    },
    /// Watch who is speaking across every active room
    Monitor {
        /// Fallback poll interval in seconds (1..=60)
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
        poll_secs: u64,
    },
    /// List active rooms
    Rooms,
    /// Show the recording history, newest first
    Recordings,
    /// Mute every participant (one room, or all active rooms)
    MuteAll {
        #[arg(short, long)]
        room: Option<String>,
    },
    /// Unmute every participant (one room, or all active rooms)
    UnmuteAll {
        #[arg(short, long)]
        room: Option<String>,
    },
    /// Remove every broadcasting participant (one room, or all active rooms)
    LogoutAll {
        #[arg(short, long)]
        room: Option<String>,
    },
    /// Remove one participant from a room
    Kick {
        #[arg(short, long)]
        room: String,

        #[arg(short, long)]
        identity: String,
    },
    /// Store an admin session for the following commands (no password is kept)
    Login {
        #[arg(short, long)]
        username: String,

        /// Display name (defaults to the username)
        #[arg(long)]
        full_name: Option<String>,

        #[arg(long, value_enum, default_value_t = Role::Admin)]
        role: Role,
    },
    /// Show the stored admin session
    Whoami,
    /// Forget the stored admin session
    Logout,
}

impl Command {
    /// Capability the stored session must grant, if any
    pub fn required_capability(&self) -> Option<Capability> {
        match self {
            Command::Broadcast { .. } => Some(Capability::Broadcast),
            Command::Monitor { .. } | Command::Rooms => Some(Capability::MonitorRooms),
            Command::Recordings => Some(Capability::Record),
            Command::MuteAll { .. } | Command::UnmuteAll { .. } => Some(Capability::MuteRooms),
            Command::LogoutAll { .. } => Some(Capability::LogoutRooms),
            Command::Kick { .. } => Some(Capability::KickUsers),
            Command::Login { .. } | Command::Whoami | Command::Logout => None,
        }
    }
}

/// Signalling endpoint served next to the relay's HTTP API
pub fn media_url_from_relay(relay_url: &str) -> String {
    let base = relay_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/rtc", base)
}

/// Run one CLI command to completion
pub async fn run(args: Args) -> Result<(), ConsoleError> {
    let media_url = args
        .media_url
        .clone()
        .unwrap_or_else(|| media_url_from_relay(&args.relay_url));
    let relay: Arc<dyn RelayApi> = Arc::new(HttpRelayClient::new(args.relay_url.as_str()));

    match args.command {
        Command::Login {
            ref username,
            ref full_name,
            role,
        } => {
            let session = AdminSession::login(username, full_name.as_deref(), role)?;
            session.save(&args.session_file)?;
            println!("Logged in as {} ({})", session.username, session.role);
            return Ok(());
        }
        Command::Whoami => {
            match AdminSession::load(&args.session_file)? {
                Some(session) => print!("{}", ConsoleFormatter::format_whoami(&session)),
                None => println!("Not logged in"),
            }
            return Ok(());
        }
        Command::Logout => {
            if AdminSession::clear(&args.session_file)? {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
            return Ok(());
        }
        _ => {}
    }

    let session = AdminSession::require_loaded(&args.session_file)?;
    if let Some(capability) = args.command.required_capability() {
        session.require(capability)?;
    }

    match args.command {
        Command::Broadcast { room, identity } => {
            let identity = identity.unwrap_or_else(|| session.username.clone());
            broadcast::run_broadcast(&session, relay, media_url, room, identity).await
        }
        Command::Monitor { poll_secs } => {
            run_monitor(relay, media_url, Duration::from_secs(poll_secs)).await;
            Ok(())
        }
        Command::Rooms => {
            let rooms = relay.list_rooms().await?;
            print!("{}", ConsoleFormatter::format_rooms(&rooms));
            Ok(())
        }
        Command::Recordings => {
            let recordings = relay.list_recordings().await?;
            print!("{}", ConsoleFormatter::format_recordings(&recordings));
            Ok(())
        }
        Command::MuteAll { room } => run_fan_out(relay.as_ref(), CommandKind::MuteAll, room).await,
        Command::UnmuteAll { room } => {
            run_fan_out(relay.as_ref(), CommandKind::UnmuteAll, room).await
        }
        Command::LogoutAll { room } => {
            run_fan_out(relay.as_ref(), CommandKind::LogoutAll, room).await
        }
        Command::Kick { room, identity } => {
            relay
                .send_room_command(RoomCommand::LogoutUser {
                    room_name: room.clone(),
                    identity: identity.clone(),
                })
                .await?;
            println!("Removed '{}' from room '{}'", identity, room);
            Ok(())
        }
        Command::Login { .. } | Command::Whoami | Command::Logout => Ok(()),
    }
}

/// `room` when given, otherwise every active room
async fn target_rooms(relay: &dyn RelayApi, room: Option<String>) -> Result<Vec<String>, RelayError> {
    match room {
        Some(room) => Ok(vec![room]),
        None => Ok(relay
            .list_rooms()
            .await?
            .into_iter()
            .map(|room| room.name)
            .collect()),
    }
}

async fn run_fan_out(
    relay: &dyn RelayApi,
    kind: CommandKind,
    room: Option<String>,
) -> Result<(), ConsoleError> {
    let rooms = target_rooms(relay, room).await?;
    let report = fan_out(relay, kind, &rooms).await;
    print!("{}", ConsoleFormatter::format_fan_out(kind, &report));

    if report.is_complete() {
        Ok(())
    } else {
        Err(ConsoleError::PartialFanOut {
            command: kind.to_string(),
            failed: report.failed.len(),
            total: rooms.len(),
        })
    }
}

async fn run_monitor(relay: Arc<dyn RelayApi>, media_url: String, poll_interval: Duration) {
    let poll_interval = clamp_poll_interval(poll_interval);
    let mut pool = MonitorPool::new(relay.clone(), Arc::new(SignalTransport::default()), media_url);

    let mut speaking = pool.aggregator().subscribe();
    let printer = tokio::spawn(async move {
        while speaking.changed().await.is_ok() {
            let current = speaking.borrow_and_update().clone();
            print!("{}", ConsoleFormatter::format_speaking(&current));
        }
    });

    // The relay has no room-change feed yet, so the poll is the only trigger
    let (_notify_tx, notifications) = mpsc::unbounded_channel();
    println!(
        "Monitoring active rooms every {}s. Press Ctrl+C to stop.",
        poll_interval.as_secs()
    );

    tokio::select! {
        _ = run_reconciler(relay, notifications, poll_interval, &mut pool) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }

    printer.abort();
    pool.shutdown().await;
}
