use std::sync::Arc;

use thiserror::Error;

use orderflow_core::{ExpectedVersion, RecordId};
use orderflow_customers::Customer;
use orderflow_invoicing::Invoice;
use orderflow_payments::Payment;
use orderflow_products::Product;
use orderflow_sales::Order;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerStoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("unique key already in use: {0}")]
    UniqueViolation(String),
}

/// One table of records of type `R`.
///
/// Reads skip soft-deleted rows; the unique-key index covers every row, so
/// `exists_by_key` still sees a key held by a deleted record.
pub trait RecordTable<R>: Send + Sync {
    /// Allocate the next primary identity.
    fn next_id(&mut self) -> RecordId;

    fn find_by_id(&self, id: RecordId) -> Option<R>;

    fn find_by_key(&self, key: &str) -> Option<R>;

    fn exists_by_key(&self, key: &str) -> bool;

    /// Insert or replace. `expected` is checked against the stored version
    /// (`0` when the row does not exist yet).
    fn save(&mut self, record: R, expected: ExpectedVersion) -> Result<(), LedgerStoreError>;

    /// All live rows, in id order.
    fn all(&self) -> Vec<R>;

    /// Live rows matching `predicate`, in id order.
    fn find_where(&self, predicate: &dyn Fn(&R) -> bool) -> Vec<R> {
        self.all().into_iter().filter(|r| predicate(r)).collect()
    }
}

/// Read access to every table.
pub trait LedgerView {
    fn customers(&self) -> &dyn RecordTable<Customer>;
    fn products(&self) -> &dyn RecordTable<Product>;
    fn orders(&self) -> &dyn RecordTable<Order>;
    fn invoices(&self) -> &dyn RecordTable<Invoice>;
    fn payments(&self) -> &dyn RecordTable<Payment>;
}

/// Write access inside a transaction.
pub trait LedgerTx {
    fn view(&self) -> &dyn LedgerView;

    fn customers_mut(&mut self) -> &mut dyn RecordTable<Customer>;
    fn products_mut(&mut self) -> &mut dyn RecordTable<Product>;
    fn orders_mut(&mut self) -> &mut dyn RecordTable<Order>;
    fn invoices_mut(&mut self) -> &mut dyn RecordTable<Invoice>;
    fn payments_mut(&mut self) -> &mut dyn RecordTable<Payment>;
}

/// Binds a domain aggregate to its table.
pub trait LedgerRecord: Clone + Send + Sync + 'static {
    /// Entity name used in not-found errors ("order").
    const ENTITY: &'static str;
    /// Aggregate type stamped on published envelopes ("sales.order").
    const AGGREGATE_TYPE: &'static str;

    fn record_id(&self) -> RecordId;
    fn record_version(&self) -> u64;
    fn is_deleted(&self) -> bool;
    /// Business keys that must be unique within the table.
    fn unique_keys(&self) -> Vec<String>;

    fn table(tx: &mut dyn LedgerTx) -> &mut dyn RecordTable<Self>;
    fn view(view: &dyn LedgerView) -> &dyn RecordTable<Self>;
}

/// Transactional record storage.
///
/// `transaction` runs `work` with exclusive write access. If `work` returns
/// `Err`, none of its writes are kept. Concurrent transactions never observe
/// each other's uncommitted writes and never lose updates.
pub trait LedgerStore: Send + Sync {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LedgerTx) -> Result<T, E>,
        E: From<LedgerStoreError>;

    fn read<T, F>(&self, query: F) -> Result<T, LedgerStoreError>
    where
        F: FnOnce(&dyn LedgerView) -> T;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore,
{
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LedgerTx) -> Result<T, E>,
        E: From<LedgerStoreError>,
    {
        (**self).transaction(work)
    }

    fn read<T, F>(&self, query: F) -> Result<T, LedgerStoreError>
    where
        F: FnOnce(&dyn LedgerView) -> T,
    {
        (**self).read(query)
    }
}
