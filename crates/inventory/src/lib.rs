//! Inventory guard.
//!
//! Stock-count rules for a single product, implemented purely as deterministic
//! domain logic (no IO, no HTTP, no storage). The product aggregate embeds a
//! [`StockLevel`] and turns its decisions into events.

pub mod stock;

pub use stock::{MovementKind, StockError, StockLevel, StockMovement};
