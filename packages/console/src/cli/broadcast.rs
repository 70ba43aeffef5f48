//! `switchboard broadcast`: a broadcast panel driven from the prompt.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    admin::{AdminSession, Capability},
    broadcast::{BroadcastPanel, ConnectionAttempt, ConnectionState, PanelConfig},
    error::ConsoleError,
    media::SignalTransport,
    relay::RelayApi,
    retry::RetryPolicy,
};

use super::{
    formatter::ConsoleFormatter,
    prompt::{HELP, PromptCommand, print_above_prompt, spawn_readline},
};

pub(super) async fn run_broadcast(
    session: &AdminSession,
    relay: Arc<dyn RelayApi>,
    media_url: String,
    room: String,
    identity: String,
) -> Result<(), ConsoleError> {
    let (state_tx, mut state_rx) = watch::channel(ConnectionAttempt::new());
    let config = PanelConfig {
        identity: identity.clone(),
        room_name: room.clone(),
        server_url: media_url,
        policy: RetryPolicy::default(),
    };
    let mut panel = BroadcastPanel::open(
        config,
        relay,
        Arc::new(SignalTransport::default()),
        Arc::new(state_tx),
    );

    let prompt = format!("{}@{}> ", identity, room);
    println!(
        "\nBroadcasting to '{}' as '{}'. {}\n",
        room, identity, HELP
    );
    let mut input = spawn_readline(prompt.clone());

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let attempt = *state_rx.borrow_and_update();
                print_above_prompt(&ConsoleFormatter::format_state(&attempt), &prompt);
            }
            line = input.recv() => {
                let Some(line) = line else {
                    break;
                };
                match PromptCommand::parse(&line) {
                    Ok(PromptCommand::Quit) => break,
                    Ok(command) => {
                        let state = *state_rx.borrow();
                        let output = handle_command(&mut panel, session, command, &state).await;
                        print!("{}", output);
                    }
                    Err(message) => println!("{}", message),
                }
            }
        }
    }

    panel.close().await;
    println!("Left room '{}'", room);
    Ok(())
}

async fn handle_command(
    panel: &mut BroadcastPanel,
    session: &AdminSession,
    command: PromptCommand,
    state: &ConnectionAttempt,
) -> String {
    match command {
        PromptCommand::Microphone(enabled) => {
            panel.set_microphone(enabled);
            format!("microphone {}\n", if enabled { "on" } else { "off" })
        }
        PromptCommand::Speaking(active) => {
            panel.set_speaking(active);
            format!("speaking {}\n", if active { "on" } else { "off" })
        }
        PromptCommand::StartRecording => {
            if let Err(e) = session.require(Capability::Record) {
                return format!("{}\n", e);
            }
            match panel.start_recording().await {
                Ok(egress_id) => format!("recording started (egress {})\n", egress_id),
                Err(e) => format!("! {}\n", e),
            }
        }
        PromptCommand::StopRecording => {
            if let Err(e) = session.require(Capability::Record) {
                return format!("{}\n", e);
            }
            match panel.stop_recording().await {
                Ok(()) => "recording stopped\n".to_string(),
                Err(e) => format!("! {}\n", e),
            }
        }
        PromptCommand::DismissBanner => {
            panel.recording_mut().dismiss_banner();
            "banner dismissed\n".to_string()
        }
        PromptCommand::Retry => {
            if state.state == ConnectionState::Failed {
                panel.retry();
                "retrying\n".to_string()
            } else {
                format!("retry is only available when FAILED (now {})\n", state.state)
            }
        }
        PromptCommand::Status => {
            let recording = panel.recording();
            let mut output = ConsoleFormatter::format_state(state);
            match &recording.session().egress_id {
                Some(egress_id) => output.push_str(&format!("recording: egress {}\n", egress_id)),
                None => output.push_str("recording: off\n"),
            }
            if let Some(banner) = recording.banner() {
                output.push_str(&format!("! {}\n", banner));
            }
            output
        }
        PromptCommand::Help => format!("{}\n", HELP),
        PromptCommand::Quit => String::new(),
    }
}
