//! Logs every event published on the bus.
//!
//! The bus only carries events of committed operations, so the audit trail
//! never shows a change that was rolled back.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::Value as JsonValue;

use orderflow_events::{EventBus, EventEnvelope};

/// Spawn a thread that logs each envelope at `info` until the bus is dropped.
///
/// Returns once the subscription is registered, so no event published after
/// this call is missed. The thread yields the number of events it logged.
pub fn spawn_event_audit<B>(bus: &B) -> JoinHandle<u64>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    let subscription = bus.subscribe();
    let (ready_tx, ready_rx) = mpsc::channel::<()>();

    let handle = thread::spawn(move || {
        let _ = ready_tx.send(());
        let mut audited = 0u64;
        while let Ok(envelope) = subscription.recv() {
            tracing::info!(
                target: "orderflow::audit",
                event_id = %envelope.event_id(),
                event_type = envelope.event_type(),
                aggregate_type = envelope.aggregate_type(),
                aggregate_id = %envelope.aggregate_id(),
                sequence = envelope.sequence_number(),
                "domain event"
            );
            audited += 1;
        }
        tracing::debug!(target: "orderflow::audit", audited, "event audit stopped");
        audited
    });

    let _ = ready_rx.recv_timeout(Duration::from_secs(1));
    handle
}
