//! Operation pipeline: one ledger transaction per engine operation, events
//! published after commit.
//!
//! ```text
//! engine operation
//!   ↓
//! 1. open a transaction (working copy of the tables)
//!   ↓
//! 2. load records, run aggregate commands, save records (version-checked)
//!   ↓
//! 3. commit, or discard every write if any step failed
//!   ↓
//! 4. publish the collected events to the bus
//! ```

use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use orderflow_core::{Aggregate, DomainError, ExpectedVersion, RecordId};
use orderflow_events::{Event, EventBus, EventEnvelope};

use crate::ledger::{LedgerRecord, LedgerStore, LedgerTx, LedgerView};

use super::error::ServiceError;

/// Envelope type carried by the bus.
pub type JsonEnvelope = EventEnvelope<JsonValue>;

/// Ledger store plus the bus its committed events go to.
#[derive(Debug)]
pub struct Ledger<S, B> {
    store: S,
    bus: B,
}

impl<S, B> Ledger<S, B>
where
    S: LedgerStore,
    B: EventBus<JsonEnvelope>,
{
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Run `work` as one transaction, then publish what it emitted.
    pub fn execute<T, F>(&self, operation: &'static str, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> Result<T, ServiceError>,
    {
        let outcome = self.store.transaction(|tx| {
            let mut uow = UnitOfWork::new(tx);
            let value = work(&mut uow)?;
            Ok::<_, ServiceError>((value, uow.into_events()))
        });

        let (value, events) = match outcome {
            Ok(done) => done,
            Err(e) => {
                tracing::warn!(operation, error = %e, "operation rejected");
                return Err(e);
            }
        };

        tracing::debug!(operation, events = events.len(), "operation committed");

        for envelope in events {
            self.bus.publish(envelope).map_err(|e| {
                tracing::error!(operation, error = %e, "event publication failed");
                ServiceError::Publish(e.to_string())
            })?;
        }

        Ok(value)
    }

    /// Run a read-only query against committed state.
    pub fn read<T, F>(&self, query: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&dyn LedgerView) -> T,
    {
        Ok(self.store.read(query)?)
    }
}

/// The writes and events of one in-flight operation.
pub struct UnitOfWork<'a> {
    tx: &'a mut dyn LedgerTx,
    events: Vec<JsonEnvelope>,
}

impl<'a> UnitOfWork<'a> {
    fn new(tx: &'a mut dyn LedgerTx) -> Self {
        Self {
            tx,
            events: Vec::new(),
        }
    }

    pub fn view(&self) -> &dyn LedgerView {
        self.tx.view()
    }

    pub fn next_id<R: LedgerRecord>(&mut self) -> RecordId {
        R::table(self.tx).next_id()
    }

    /// Load a live record or fail with `NotFound`.
    pub fn load<R: LedgerRecord>(&self, id: RecordId) -> Result<R, ServiceError> {
        self.find::<R>(id)
            .ok_or_else(|| DomainError::not_found(R::ENTITY, id).into())
    }

    pub fn find<R: LedgerRecord>(&self, id: RecordId) -> Option<R> {
        R::view(self.tx.view()).find_by_id(id)
    }

    pub fn exists_by_key<R: LedgerRecord>(&self, key: &str) -> bool {
        R::view(self.tx.view()).exists_by_key(key)
    }

    /// Handle `command` on `aggregate`, save the result and queue its events.
    ///
    /// The save is checked against the version the aggregate had before the
    /// command, so a record changed behind our back is a concurrency error.
    pub fn execute<A>(&mut self, aggregate: &mut A, command: A::Command) -> Result<(), ServiceError>
    where
        A: Aggregate<Error = DomainError> + LedgerRecord,
        A::Event: Event + Serialize,
    {
        let base_version = aggregate.record_version();
        let events = orderflow_events::execute(aggregate, &command)?;

        A::table(self.tx).save(aggregate.clone(), ExpectedVersion::Exact(base_version))?;

        let aggregate_id = aggregate.record_id();
        for (offset, event) in events.iter().enumerate() {
            let payload = serde_json::to_value(event)
                .map_err(|e| ServiceError::Serialization(e.to_string()))?;
            self.events.push(EventEnvelope::new(
                Uuid::now_v7(),
                aggregate_id,
                A::AGGREGATE_TYPE,
                event.event_type(),
                base_version + offset as u64 + 1,
                payload,
            ));
        }
        Ok(())
    }

    fn into_events(self) -> Vec<JsonEnvelope> {
        self.events
    }
}
