use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use orderflow_core::{ExpectedVersion, RecordId};
use orderflow_customers::Customer;
use orderflow_invoicing::Invoice;
use orderflow_payments::Payment;
use orderflow_products::Product;
use orderflow_sales::Order;

use super::store::{LedgerRecord, LedgerStore, LedgerStoreError, LedgerTx, LedgerView, RecordTable};

/// A table held in memory: rows by id plus a unique-key index.
#[derive(Debug, Clone)]
pub struct InMemoryTable<R> {
    next_id: u64,
    rows: BTreeMap<RecordId, R>,
    keys: HashMap<String, RecordId>,
}

impl<R> Default for InMemoryTable<R> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
            keys: HashMap::new(),
        }
    }
}

impl<R> InMemoryTable<R> {
    /// Number of rows, soft-deleted ones included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R: LedgerRecord> RecordTable<R> for InMemoryTable<R> {
    fn next_id(&mut self) -> RecordId {
        let id = RecordId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn find_by_id(&self, id: RecordId) -> Option<R> {
        self.rows.get(&id).filter(|r| !r.is_deleted()).cloned()
    }

    fn find_by_key(&self, key: &str) -> Option<R> {
        self.keys.get(key).and_then(|id| self.find_by_id(*id))
    }

    fn exists_by_key(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    fn save(&mut self, record: R, expected: ExpectedVersion) -> Result<(), LedgerStoreError> {
        let id = record.record_id();
        let stored_version = self.rows.get(&id).map_or(0, LedgerRecord::record_version);

        if !expected.matches(stored_version) {
            return Err(LedgerStoreError::Concurrency(format!(
                "{} {id}: expected {expected:?}, stored version {stored_version}",
                R::ENTITY
            )));
        }

        let new_keys = record.unique_keys();
        for key in &new_keys {
            if let Some(owner) = self.keys.get(key) {
                if *owner != id {
                    return Err(LedgerStoreError::UniqueViolation(format!("{} {key}", R::ENTITY)));
                }
            }
        }

        if let Some(previous) = self.rows.get(&id) {
            for key in previous.unique_keys() {
                self.keys.remove(&key);
            }
        }
        for key in new_keys {
            self.keys.insert(key, id);
        }
        if id.get() >= self.next_id {
            self.next_id = id.get() + 1;
        }
        self.rows.insert(id, record);
        Ok(())
    }

    fn all(&self) -> Vec<R> {
        self.rows.values().filter(|r| !r.is_deleted()).cloned().collect()
    }

    fn find_where(&self, predicate: &dyn Fn(&R) -> bool) -> Vec<R> {
        self.rows
            .values()
            .filter(|r| !r.is_deleted() && predicate(r))
            .cloned()
            .collect()
    }
}

/// Every table of the ledger. Cloned to form a transaction's working copy.
#[derive(Debug, Clone, Default)]
pub struct LedgerTables {
    customers: InMemoryTable<Customer>,
    products: InMemoryTable<Product>,
    orders: InMemoryTable<Order>,
    invoices: InMemoryTable<Invoice>,
    payments: InMemoryTable<Payment>,
}

impl LedgerView for LedgerTables {
    fn customers(&self) -> &dyn RecordTable<Customer> {
        &self.customers
    }

    fn products(&self) -> &dyn RecordTable<Product> {
        &self.products
    }

    fn orders(&self) -> &dyn RecordTable<Order> {
        &self.orders
    }

    fn invoices(&self) -> &dyn RecordTable<Invoice> {
        &self.invoices
    }

    fn payments(&self) -> &dyn RecordTable<Payment> {
        &self.payments
    }
}

impl LedgerTx for LedgerTables {
    fn view(&self) -> &dyn LedgerView {
        self
    }

    fn customers_mut(&mut self) -> &mut dyn RecordTable<Customer> {
        &mut self.customers
    }

    fn products_mut(&mut self) -> &mut dyn RecordTable<Product> {
        &mut self.products
    }

    fn orders_mut(&mut self) -> &mut dyn RecordTable<Order> {
        &mut self.orders
    }

    fn invoices_mut(&mut self) -> &mut dyn RecordTable<Invoice> {
        &mut self.invoices
    }

    fn payments_mut(&mut self) -> &mut dyn RecordTable<Payment> {
        &mut self.payments
    }
}

/// In-memory ledger store.
///
/// Transactions are serialized by a store-wide lock and work on a copy of the
/// tables; the copy replaces the committed tables only when the work returns
/// `Ok`. A unit of work that panics only ever touched its copy, so a poisoned
/// lock still guards consistent tables and is recovered rather than reported.
/// Intended for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    tables: Mutex<LedgerTables>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LedgerTx) -> Result<T, E>,
        E: From<LedgerStoreError>,
    {
        let mut committed = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let mut working = committed.clone();

        let value = work(&mut working)?;

        *committed = working;
        Ok(value)
    }

    fn read<T, F>(&self, query: F) -> Result<T, LedgerStoreError>
    where
        F: FnOnce(&dyn LedgerView) -> T,
    {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(query(&*tables))
    }
}
