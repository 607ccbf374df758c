//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Every variant
/// is raised synchronously and never retried inside the domain; mapping to a
/// transport status is the request layer's job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A referenced entity does not exist (or is soft-deleted).
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The request is malformed or not allowed in the current state.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A stock operation would break the stock counters.
    #[error("insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: i64,
        available: i64,
    },

    /// The order status transition is not in the transition table.
    #[error("invalid order status transition from {from} to {to}")]
    InvalidOrderTransition { from: String, to: String },

    /// The order can no longer be processed this way (e.g. cancelling a shipped order).
    #[error("order processing error: {0}")]
    OrderProcessing(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A conflict occurred (e.g. stale version / optimistic concurrency).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn insufficient_stock(product: impl Into<String>, requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            product: product.into(),
            requested,
            available,
        }
    }

    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidOrderTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn order_processing(msg: impl Into<String>) -> Self {
        Self::OrderProcessing(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
