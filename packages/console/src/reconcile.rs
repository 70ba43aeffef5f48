//! Keeps a local view in step with the relay's active rooms.
//!
//! Snapshots are fetched once at start, on every change notification and on
//! a fallback poll. The sink must tolerate receiving the same snapshot twice.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use switchboard_shared::protocol::RoomSnapshot;
use tokio::{sync::mpsc, time::MissedTickBehavior};

use crate::relay::RelayApi;

pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Receiver of room snapshots
#[async_trait]
pub trait SnapshotSink: Send {
    /// Bring local state in line with `rooms`; must be idempotent
    async fn apply_snapshot(&mut self, rooms: Vec<RoomSnapshot>);
}

pub fn clamp_poll_interval(interval: Duration) -> Duration {
    interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL)
}

/// Run until the surrounding task is dropped.
///
/// A notification triggers an immediate fetch and restarts the poll timer.
/// Once the notification channel closes, polling alone keeps the sink fresh.
pub async fn run_reconciler<S>(
    source: Arc<dyn RelayApi>,
    mut notifications: mpsc::UnboundedReceiver<()>,
    poll_interval: Duration,
    sink: &mut S,
) where
    S: SnapshotSink + ?Sized,
{
    let mut ticker = tokio::time::interval(clamp_poll_interval(poll_interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut notifications_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            received = notifications.recv(), if notifications_open => {
                if received.is_none() {
                    tracing::debug!("Room notifications closed, falling back to polling only");
                    notifications_open = false;
                    continue;
                }
                ticker.reset();
            }
        }

        match source.list_rooms().await {
            Ok(rooms) => {
                tracing::debug!("Room snapshot: {} active room(s)", rooms.len());
                sink.apply_snapshot(rooms).await;
            }
            Err(e) => tracing::warn!("Failed to fetch room snapshot: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::RelayError, relay::MockRelayApi};
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Clone, Default)]
    struct CollectingSink {
        applied: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl CollectingSink {
        fn applied(&self) -> Vec<Vec<String>> {
            self.applied.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SnapshotSink for CollectingSink {
        async fn apply_snapshot(&mut self, rooms: Vec<RoomSnapshot>) {
            let names = rooms.into_iter().map(|room| room.name).collect();
            self.applied.lock().unwrap().push(names);
        }
    }

    fn snapshot(name: &str) -> RoomSnapshot {
        RoomSnapshot {
            name: name.to_string(),
            participants: Vec::new(),
            recording: None,
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    fn counting_relay(calls: Arc<AtomicUsize>) -> MockRelayApi {
        let mut relay = MockRelayApi::new();
        relay.expect_list_rooms().returning(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![snapshot("Lobby")])
        });
        relay
    }

    fn spawn_reconciler(
        relay: MockRelayApi,
        notifications: mpsc::UnboundedReceiver<()>,
        sink: &CollectingSink,
    ) -> tokio::task::JoinHandle<()> {
        let mut sink = sink.clone();
        tokio::spawn(async move {
            run_reconciler(Arc::new(relay), notifications, Duration::from_secs(5), &mut sink)
                .await;
        })
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[test]
    fn test_poll_interval_is_bounded() {
        // テスト項目: ポーリング間隔は 1 秒から 60 秒の範囲に収まる
        // given (前提条件):
        let too_short = Duration::from_millis(10);
        let too_long = Duration::from_secs(600);

        // when (操作):
        let short = clamp_poll_interval(too_short);
        let long = clamp_poll_interval(too_long);

        // then (期待する結果):
        assert_eq!(short, MIN_POLL_INTERVAL);
        assert_eq!(long, MAX_POLL_INTERVAL);
        assert_eq!(clamp_poll_interval(DEFAULT_POLL_INTERVAL), DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_at_start_and_on_every_poll() {
        // テスト項目: 起動時に 1 回取得し、その後はポーリング間隔ごとに取得する
        // given (前提条件):
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = CollectingSink::default();
        let (_tx, rx) = mpsc::unbounded_channel();

        // when (操作):
        let task = spawn_reconciler(counting_relay(calls.clone()), rx, &sink);
        settle().await;
        let at_start = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;

        // then (期待する結果):
        assert_eq!(at_start, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sink.applied().len(), 3);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_triggers_immediate_fetch() {
        // テスト項目: 変更通知を受けるとポーリングを待たずに取得する
        // given (前提条件):
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = CollectingSink::default();
        let (tx, rx) = mpsc::unbounded_channel();
        let task = spawn_reconciler(counting_relay(calls.clone()), rx, &sink);
        settle().await;

        // when (操作):
        tx.send(()).unwrap();
        settle().await;

        // then (期待する結果):
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(sink.applied()[1], vec!["Lobby".to_string()]);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_notifications_keep_polling() {
        // テスト項目: 通知チャネルが閉じてもポーリングは続く
        // given (前提条件):
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = CollectingSink::default();
        let (tx, rx) = mpsc::unbounded_channel();
        let task = spawn_reconciler(counting_relay(calls.clone()), rx, &sink);
        settle().await;

        // when (操作):
        drop(tx);
        tokio::time::sleep(Duration::from_secs(5)).await;

        // then (期待する結果):
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!task.is_finished());
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_is_skipped() {
        // テスト項目: 取得エラーはログに出してスキップし、次の取得は反映される
        // given (前提条件):
        let calls = AtomicUsize::new(0);
        let mut relay = MockRelayApi::new();
        relay.expect_list_rooms().returning(move || {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(RelayError::Unreachable("connection refused".to_string()))
            } else {
                Ok(vec![snapshot("Lobby")])
            }
        });
        let sink = CollectingSink::default();
        let (_tx, rx) = mpsc::unbounded_channel();

        // when (操作):
        let task = spawn_reconciler(relay, rx, &sink);
        settle().await;
        let after_error = sink.applied().len();
        tokio::time::sleep(Duration::from_secs(5)).await;

        // then (期待する結果):
        assert_eq!(after_error, 0);
        assert_eq!(sink.applied(), vec![vec!["Lobby".to_string()]]);
        task.abort();
    }
}
