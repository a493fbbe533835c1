// SPDX-License-Identifier: MIT

//! Event bus for migration lifecycle and progress events.
//!
//! One topic, fire-and-forget: publishing never blocks on subscribers,
//! and a slow subscriber only loses its own backlog (broadcast channel
//! lag), never the orchestrator's throughput.

use airlift_core::MigrationEvent;
use tokio::sync::broadcast;

/// Default buffered events per subscriber.
const DEFAULT_CAPACITY: usize = 256;

/// Fire-and-forget publisher for [`MigrationEvent`]s.
#[derive(Clone)]
pub struct MigrationBus {
    tx: broadcast::Sender<MigrationEvent>,
}

impl MigrationBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Send errors (no subscribers) are ignored.
    pub fn publish(&self, event: MigrationEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MigrationEvent> {
        self.tx.subscribe()
    }
}

impl Default for MigrationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
