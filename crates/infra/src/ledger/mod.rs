//! Ledger store: durable records for customers, products, orders, invoices
//! and payments, with transactional writes.
//!
//! Engines never touch tables directly outside a transaction. Every public
//! engine operation is exactly one `LedgerStore::transaction` call: either all
//! of its writes become visible or none do.

mod in_memory;
mod records;
mod store;

pub use in_memory::{InMemoryLedgerStore, InMemoryTable, LedgerTables};
pub use store::{LedgerRecord, LedgerStore, LedgerStoreError, LedgerTx, LedgerView, RecordTable};
