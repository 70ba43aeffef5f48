//! Logging setup utilities shared by the console and the relay.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose log output is enabled at the default level.
const WORKSPACE_CRATES: [&str; 3] = [
    "switchboard_shared",
    "switchboard_console",
    "switchboard_relay",
];

/// Build the default filter directive for the workspace crates and the binary.
fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace("-", "_");
    let mut targets: Vec<String> = WORKSPACE_CRATES.iter().map(|name| name.to_string()).collect();
    if !targets.contains(&binary_target) {
        targets.push(binary_target);
    }

    targets
        .iter()
        .map(|target| format!("{}={}", target, default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "switchboard", "switchboard-relay")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use switchboard_shared::logger::setup_logger;
///
/// setup_logger("switchboard-relay", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_covers_workspace_and_binary() {
        // テスト項目: ワークスペースの全クレートとバイナリにログレベルが設定される
        // given (前提条件):
        let binary_name = "switchboard";

        // when (操作):
        let directive = default_directive(binary_name, "info");

        // then (期待する結果):
        assert_eq!(
            directive,
            "switchboard_shared=info,switchboard_console=info,switchboard_relay=info,switchboard=info"
        );
    }

    #[test]
    fn test_default_directive_does_not_repeat_library_binary() {
        // テスト項目: バイナリ名がライブラリ名と同じ場合は重複しない
        // given (前提条件):
        let binary_name = "switchboard-relay";

        // when (操作):
        let directive = default_directive(binary_name, "debug");

        // then (期待する結果):
        assert_eq!(directive.matches("switchboard_relay=").count(), 1);
    }
}
