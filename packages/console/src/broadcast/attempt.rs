//! Connection state of a broadcast panel.
//!
//! Pure transitions only, no I/O; the panel driver feeds results in and acts
//! on the returned [`Step`].

use std::{fmt, time::Duration};

use crate::retry::RetryPolicy;

/// Consecutive token-fetch failures after which the panel stops retrying
pub const MAX_AUTOMATIC_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Connected => "CONNECTED",
            ConnectionState::Reconnecting => "RECONNECTING",
            ConnectionState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// What the driver must do after a token-fetch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Sleep, then run the next attempt
    Retry(Duration),
    /// Stop; only a manual retry continues
    GiveUp,
}

/// One attempt sequence of a broadcast panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionAttempt {
    /// Number of the attempt in flight (0 = first)
    pub attempt_number: u32,
    pub state: ConnectionState,
    /// Delay scheduled before `attempt_number` runs
    pub scheduled_delay: Duration,
}

impl Default for ConnectionAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionAttempt {
    /// Fresh sequence, as on panel open
    pub fn new() -> Self {
        Self {
            attempt_number: 0,
            state: ConnectionState::Connecting,
            scheduled_delay: Duration::ZERO,
        }
    }

    /// The token fetch succeeded
    pub fn on_token_issued(&mut self) {
        self.attempt_number = 0;
        self.scheduled_delay = Duration::ZERO;
        self.state = ConnectionState::Connected;
    }

    /// The token fetch failed; `delay` is `RetryPolicy::delay(attempt_number)`
    pub fn on_token_failed_with(&mut self, delay: Duration) -> Step {
        let failures = self.attempt_number.saturating_add(1);
        if failures >= MAX_AUTOMATIC_ATTEMPTS {
            self.state = ConnectionState::Failed;
            self.scheduled_delay = Duration::ZERO;
            return Step::GiveUp;
        }

        if self.attempt_number > 0 {
            self.state = ConnectionState::Reconnecting;
        }
        self.attempt_number = failures;
        self.scheduled_delay = delay;
        Step::Retry(delay)
    }

    /// [`ConnectionAttempt::on_token_failed_with`] drawing the delay from `policy`
    pub fn on_token_failed(&mut self, policy: &RetryPolicy) -> Step {
        let delay = policy.delay(self.attempt_number);
        self.on_token_failed_with(delay)
    }

    /// Transport dropped; returns whether the state changed
    pub fn on_transport_lost(&mut self) -> bool {
        if self.state == ConnectionState::Connected {
            self.state = ConnectionState::Reconnecting;
            return true;
        }
        false
    }

    /// Transport reconnected on its own; returns whether the state changed
    pub fn on_transport_restored(&mut self) -> bool {
        if self.state == ConnectionState::Reconnecting {
            self.state = ConnectionState::Connected;
            return true;
        }
        false
    }

    /// The media session is over (removed from the room or closed remotely)
    pub fn on_session_ended(&mut self) {
        self.state = ConnectionState::Failed;
        self.scheduled_delay = Duration::ZERO;
    }

    /// Operator asked to retry; only honoured from `Failed`
    pub fn manual_retry(&mut self) -> bool {
        if self.state != ConnectionState::Failed {
            return false;
        }
        *self = Self::new();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fail(attempt: &mut ConnectionAttempt) -> Step {
        let delay = Duration::from_millis(u64::from(attempt.attempt_number) * 10);
        attempt.on_token_failed_with(delay)
    }

    #[test]
    fn test_initial_state_is_connecting() {
        // テスト項目: 初期状態は CONNECTING, attempt 0
        // given (前提条件):

        // when (操作):
        let attempt = ConnectionAttempt::new();

        // then (期待する結果):
        assert_eq!(attempt.state, ConnectionState::Connecting);
        assert_eq!(attempt.attempt_number, 0);
    }

    #[test]
    fn test_first_failure_stays_connecting() {
        // テスト項目: 最初の失敗では CONNECTING のまま、attempt が 1 になる
        // given (前提条件):
        let mut attempt = ConnectionAttempt::new();

        // when (操作):
        let step = fail(&mut attempt);

        // then (期待する結果):
        assert_eq!(step, Step::Retry(Duration::ZERO));
        assert_eq!(attempt.state, ConnectionState::Connecting);
        assert_eq!(attempt.attempt_number, 1);
    }

    #[test]
    fn test_later_failures_move_to_reconnecting() {
        // テスト項目: 2 回目以降の失敗で RECONNECTING に遷移する
        // given (前提条件):
        let mut attempt = ConnectionAttempt::new();
        fail(&mut attempt);

        // when (操作):
        let step = fail(&mut attempt);

        // then (期待する結果):
        assert_eq!(step, Step::Retry(Duration::from_millis(10)));
        assert_eq!(attempt.state, ConnectionState::Reconnecting);
        assert_eq!(attempt.attempt_number, 2);
        assert_eq!(attempt.scheduled_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_tenth_failure_gives_up() {
        // テスト項目: 10 回連続で失敗すると FAILED になり、それ以上スケジュールしない
        // given (前提条件):
        let mut attempt = ConnectionAttempt::new();
        for _ in 0..9 {
            assert!(matches!(fail(&mut attempt), Step::Retry(_)));
        }

        // when (操作):
        let step = fail(&mut attempt);

        // then (期待する結果):
        assert_eq!(step, Step::GiveUp);
        assert_eq!(attempt.state, ConnectionState::Failed);
        assert_eq!(attempt.attempt_number, 9);
    }

    #[test]
    fn test_attempt_number_is_monotonic_within_sequence() {
        // テスト項目: 一連の試行の中で attempt は単調増加する
        // given (前提条件):
        let mut attempt = ConnectionAttempt::new();
        let mut previous = attempt.attempt_number;

        for _ in 0..MAX_AUTOMATIC_ATTEMPTS {
            // when (操作):
            fail(&mut attempt);

            // then (期待する結果):
            assert!(attempt.attempt_number >= previous);
            previous = attempt.attempt_number;
        }
    }

    #[test]
    fn test_token_success_resets_counter() {
        // テスト項目: トークン取得成功で CONNECTED になり attempt が 0 に戻る
        // given (前提条件):
        let mut attempt = ConnectionAttempt::new();
        fail(&mut attempt);
        fail(&mut attempt);

        // when (操作):
        attempt.on_token_issued();

        // then (期待する結果):
        assert_eq!(attempt.state, ConnectionState::Connected);
        assert_eq!(attempt.attempt_number, 0);
        assert_eq!(attempt.scheduled_delay, Duration::ZERO);
    }

    #[test]
    fn test_manual_retry_only_from_failed() {
        // テスト項目: 手動リトライは FAILED からのみ受け付け、attempt を 0 に戻す
        // given (前提条件):
        let mut attempt = ConnectionAttempt::new();
        assert!(!attempt.manual_retry());
        for _ in 0..MAX_AUTOMATIC_ATTEMPTS {
            fail(&mut attempt);
        }

        // when (操作):
        let accepted = attempt.manual_retry();

        // then (期待する結果):
        assert!(accepted);
        assert_eq!(attempt, ConnectionAttempt::new());
    }

    #[test]
    fn test_transport_loss_and_recovery() {
        // テスト項目: 接続後のトランスポート切断で RECONNECTING、復帰で CONNECTED
        // given (前提条件):
        let mut attempt = ConnectionAttempt::new();
        attempt.on_token_issued();

        // when (操作):
        let lost = attempt.on_transport_lost();
        let lost_again = attempt.on_transport_lost();
        let restored = attempt.on_transport_restored();

        // then (期待する結果):
        assert!(lost);
        assert!(!lost_again);
        assert!(restored);
        assert_eq!(attempt.state, ConnectionState::Connected);
    }

    #[test]
    fn test_transport_events_ignored_when_failed() {
        // テスト項目: FAILED ではトランスポートのイベントで状態が変わらない
        // given (前提条件):
        let mut attempt = ConnectionAttempt::new();
        attempt.on_session_ended();

        // when (操作):
        let changed = attempt.on_transport_restored() || attempt.on_transport_lost();

        // then (期待する結果):
        assert!(!changed);
        assert_eq!(attempt.state, ConnectionState::Failed);
    }
}
