//! `orderflow-core` - domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! aggregate execution semantics, the error taxonomy, record identity and audit
//! metadata, status transition tables, money rounding and business keys.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod keys;
pub mod money;
pub mod record;
pub mod transition;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::RecordId;
pub use keys::{BusinessKeyPrefix, business_key, transaction_id};
pub use money::{Money, money_in_range, round_money};
pub use record::RecordMeta;
pub use transition::TransitionTable;
pub use value_object::ValueObject;
