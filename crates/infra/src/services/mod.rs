//! Engines over the ledger store.
//!
//! Each public operation runs as exactly one ledger transaction (see
//! [`Ledger::execute`]); its events are published only after commit.

mod billing;
mod catalog;
mod customers;
mod error;
mod ledger;
mod orders;
mod payments;

use std::sync::Arc;

use orderflow_events::{EventBus, InMemoryEventBus};

pub use billing::BillingEngine;
pub use catalog::{CatalogService, NewProduct, ProductChanges};
pub use customers::{CustomerChanges, CustomerService, NewCustomer};
pub use error::ServiceError;
pub use ledger::{JsonEnvelope, Ledger, UnitOfWork};
pub use orders::{OrderLifecycleEngine, OrderLineRequest, PlaceOrderRequest};
pub use payments::{PaymentProcessor, PaymentRequest};

use crate::config::OrderflowConfig;
use crate::ledger::{InMemoryLedgerStore, LedgerStore};

/// Every engine, sharing one ledger.
pub struct OrderflowServices<S, B> {
    pub ledger: Arc<Ledger<S, B>>,
    pub customers: CustomerService<S, B>,
    pub catalog: CatalogService<S, B>,
    pub orders: OrderLifecycleEngine<S, B>,
    pub billing: BillingEngine<S, B>,
    pub payments: PaymentProcessor<S, B>,
}

impl<S, B> OrderflowServices<S, B>
where
    S: LedgerStore,
    B: EventBus<JsonEnvelope>,
{
    pub fn new(store: S, bus: B, config: &OrderflowConfig) -> Self {
        let ledger = Arc::new(Ledger::new(store, bus));
        Self {
            customers: CustomerService::new(ledger.clone()),
            catalog: CatalogService::new(ledger.clone()),
            orders: OrderLifecycleEngine::new(ledger.clone(), config.pricing),
            billing: BillingEngine::new(ledger.clone(), config.billing),
            payments: PaymentProcessor::new(ledger.clone()),
            ledger,
        }
    }
}

pub type InMemoryServices = OrderflowServices<InMemoryLedgerStore, Arc<InMemoryEventBus<JsonEnvelope>>>;

impl InMemoryServices {
    pub fn in_memory(config: &OrderflowConfig) -> Self {
        Self::new(InMemoryLedgerStore::new(), Arc::new(InMemoryEventBus::new()), config)
    }
}
