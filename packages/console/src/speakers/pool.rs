use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use switchboard_shared::protocol::RoomSnapshot;

use crate::{media::MediaTransport, reconcile::SnapshotSink, relay::RelayApi};

use super::{aggregator::SpeakerAggregator, monitor::RoomSpeakerMonitor};

/// One monitor per known room, all feeding the same aggregator
pub struct MonitorPool {
    relay: Arc<dyn RelayApi>,
    transport: Arc<dyn MediaTransport>,
    server_url: String,
    aggregator: Arc<SpeakerAggregator>,
    monitors: HashMap<String, RoomSpeakerMonitor>,
}

impl MonitorPool {
    pub fn new(
        relay: Arc<dyn RelayApi>,
        transport: Arc<dyn MediaTransport>,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            relay,
            transport,
            server_url: server_url.into(),
            aggregator: SpeakerAggregator::new(),
            monitors: HashMap::new(),
        }
    }

    pub fn aggregator(&self) -> &Arc<SpeakerAggregator> {
        &self.aggregator
    }

    /// Rooms with a running monitor, sorted
    pub fn monitored_rooms(&self) -> Vec<String> {
        let mut rooms: Vec<String> = self.monitors.keys().cloned().collect();
        rooms.sort();
        rooms
    }

    /// Start monitors for new rooms and stop those whose room disappeared.
    ///
    /// Rooms already monitored are left untouched, so calling this with the
    /// same list again is a no-op. A monitor that ended on its own is
    /// replaced.
    pub async fn sync_rooms(&mut self, rooms: &[String]) {
        let gone: Vec<String> = self
            .monitors
            .keys()
            .filter(|name| !rooms.contains(name))
            .cloned()
            .collect();
        for name in gone {
            if let Some(monitor) = self.monitors.remove(&name) {
                monitor.close().await;
            }
        }

        for name in rooms {
            match self.monitors.get(name) {
                Some(monitor) if !monitor.is_finished() => continue,
                Some(_) => {
                    tracing::info!("Monitor for room '{}' ended, restarting", name);
                    if let Some(finished) = self.monitors.remove(name) {
                        finished.close().await;
                    }
                }
                None => {}
            }
            let monitor = RoomSpeakerMonitor::spawn(
                self.aggregator.handle(name.as_str()),
                self.relay.clone(),
                self.transport.clone(),
                self.server_url.clone(),
            );
            self.monitors.insert(name.clone(), monitor);
        }
    }

    /// Stop every monitor
    pub async fn shutdown(&mut self) {
        for (_, monitor) in self.monitors.drain() {
            monitor.close().await;
        }
    }
}

#[async_trait]
impl SnapshotSink for MonitorPool {
    async fn apply_snapshot(&mut self, rooms: Vec<RoomSnapshot>) {
        let names: Vec<String> = rooms.into_iter().map(|room| room.name).collect();
        self.sync_rooms(&names).await;
    }
}
