//! Interactive prompt of the broadcast command.

use std::io::Write;

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

/// One line typed at the broadcast prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptCommand {
    Microphone(bool),
    Speaking(bool),
    StartRecording,
    StopRecording,
    DismissBanner,
    Retry,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "commands: mic on|off, speak on|off, record start|stop, dismiss, retry, status, help, quit";

impl PromptCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            ["mic", flag] => PromptCommand::Microphone(parse_switch(flag)?),
            ["speak", flag] => PromptCommand::Speaking(parse_switch(flag)?),
            ["record", "start"] => PromptCommand::StartRecording,
            ["record", "stop"] => PromptCommand::StopRecording,
            ["dismiss"] => PromptCommand::DismissBanner,
            ["retry"] => PromptCommand::Retry,
            ["status"] => PromptCommand::Status,
            ["help"] | ["?"] => PromptCommand::Help,
            ["quit"] | ["exit"] => PromptCommand::Quit,
            _ => return Err(format!("Unknown command '{}'. {}", line.trim(), HELP)),
        };
        Ok(command)
    }
}

fn parse_switch(flag: &str) -> Result<bool, String> {
    match flag {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(format!("Expected 'on' or 'off', got '{}'", other)),
    }
}

/// Read lines on a dedicated thread and forward them.
///
/// The channel closes on Ctrl+C, Ctrl+D or a readline error.
pub fn spawn_readline(prompt: String) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line).ok();
                    if input_tx.send(line.to_string()).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}

/// Print `text` and redraw the prompt after it
pub fn print_above_prompt(text: &str, prompt: &str) {
    print!("\n{}{}", text, prompt);
    std::io::stdout().flush().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_switch_commands() {
        // テスト項目: mic / speak の on/off が解析される
        // given (前提条件):
        let lines = ["mic on", "mic off", "speak on", "  speak   off  "];

        // when (操作):
        let parsed: Vec<PromptCommand> = lines
            .iter()
            .map(|line| PromptCommand::parse(line).unwrap())
            .collect();

        // then (期待する結果):
        assert_eq!(
            parsed,
            vec![
                PromptCommand::Microphone(true),
                PromptCommand::Microphone(false),
                PromptCommand::Speaking(true),
                PromptCommand::Speaking(false),
            ]
        );
    }

    #[test]
    fn test_parse_recording_and_panel_commands() {
        // テスト項目: 録音・バナー・リトライ・終了コマンドが解析される
        // given (前提条件):
        let cases = [
            ("record start", PromptCommand::StartRecording),
            ("record stop", PromptCommand::StopRecording),
            ("dismiss", PromptCommand::DismissBanner),
            ("retry", PromptCommand::Retry),
            ("status", PromptCommand::Status),
            ("quit", PromptCommand::Quit),
            ("exit", PromptCommand::Quit),
        ];

        for (line, expected) in cases {
            // when (操作):
            let parsed = PromptCommand::parse(line);

            // then (期待する結果):
            assert_eq!(parsed, Ok(expected), "{}", line);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_input() {
        // テスト項目: 不明なコマンドや不正なスイッチはエラーになる
        // given (前提条件):
        let unknown = "shout";
        let bad_switch = "mic maybe";

        // when (操作):
        let unknown_result = PromptCommand::parse(unknown);
        let bad_switch_result = PromptCommand::parse(bad_switch);

        // then (期待する結果):
        assert!(unknown_result.unwrap_err().contains("Unknown command 'shout'"));
        assert!(bad_switch_result.unwrap_err().contains("'maybe'"));
    }
}
