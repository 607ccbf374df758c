//! On-hand and reserved counters.
//!
//! `available = on_hand - reserved`, and `0 <= reserved <= on_hand` holds after
//! every operation. Operations are split the same way aggregates are:
//! `reserve`/`release`/`commit`/`adjust` decide a [`StockMovement`] without
//! mutating, [`StockLevel::apply`] evolves the counters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use orderflow_core::{DomainError, ValueObject};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("quantity must be positive (got {0})")]
    NonPositiveQuantity(i64),

    #[error("stock adjustment cannot be zero")]
    ZeroAdjustment,

    #[error("stock quantity out of range (on hand {on_hand}, adjustment {delta})")]
    QuantityOutOfRange { on_hand: i64, delta: i64 },

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("inconsistent stock counters (on hand {on_hand}, reserved {reserved})")]
    InconsistentCounters { on_hand: i64, reserved: i64 },
}

impl StockError {
    /// Attach the product business key and lift into the domain taxonomy.
    pub fn into_domain(self, product: &str) -> DomainError {
        match self {
            StockError::InsufficientStock {
                requested,
                available,
            } => DomainError::insufficient_stock(product, requested, available),
            StockError::InconsistentCounters { .. } => {
                DomainError::invariant(format!("{product}: {self}"))
            }
            other => DomainError::invalid_request(format!("{product}: {other}")),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    Reserve,
    Release,
    Commit,
    Adjust,
}

/// A decided change to the counters.
///
/// Deltas are computed at decision time (including the release/commit clamp),
/// so applying a movement never needs to re-check anything.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub kind: MovementKind,
    /// Quantity the caller asked for (for adjustments, the signed delta).
    pub quantity: i64,
    pub on_hand_delta: i64,
    pub reserved_delta: i64,
}

impl ValueObject for StockMovement {}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    on_hand: i64,
    reserved: i64,
}

impl ValueObject for StockLevel {}

impl StockLevel {
    /// Fresh stock with nothing reserved.
    pub fn new(on_hand: i64) -> Result<Self, StockError> {
        Self::from_counts(on_hand, 0)
    }

    pub fn from_counts(on_hand: i64, reserved: i64) -> Result<Self, StockError> {
        if reserved < 0 || on_hand < 0 || reserved > on_hand {
            return Err(StockError::InconsistentCounters { on_hand, reserved });
        }
        Ok(Self { on_hand, reserved })
    }

    pub fn on_hand(&self) -> i64 {
        self.on_hand
    }

    pub fn reserved(&self) -> i64 {
        self.reserved
    }

    pub fn available(&self) -> i64 {
        self.on_hand - self.reserved
    }

    /// Low stock iff a minimum is configured and available stock is at or below it.
    pub fn is_low(&self, min_level: Option<i64>) -> bool {
        min_level.is_some_and(|min| self.available() <= min)
    }

    pub fn reserve(&self, qty: i64) -> Result<StockMovement, StockError> {
        ensure_positive(qty)?;
        if self.available() < qty {
            return Err(StockError::InsufficientStock {
                requested: qty,
                available: self.available(),
            });
        }
        Ok(StockMovement {
            kind: MovementKind::Reserve,
            quantity: qty,
            on_hand_delta: 0,
            reserved_delta: qty,
        })
    }

    /// Over-release clamps at zero instead of failing.
    pub fn release(&self, qty: i64) -> Result<StockMovement, StockError> {
        ensure_positive(qty)?;
        Ok(StockMovement {
            kind: MovementKind::Release,
            quantity: qty,
            on_hand_delta: 0,
            reserved_delta: -(qty.min(self.reserved)),
        })
    }

    /// Ship reserved units out of the warehouse.
    pub fn commit(&self, qty: i64) -> Result<StockMovement, StockError> {
        ensure_positive(qty)?;
        if self.on_hand < qty {
            return Err(StockError::InsufficientStock {
                requested: qty,
                available: self.on_hand,
            });
        }
        Ok(StockMovement {
            kind: MovementKind::Commit,
            quantity: qty,
            on_hand_delta: -qty,
            reserved_delta: -(qty.min(self.reserved)),
        })
    }

    /// Manual correction of on-hand stock. Reserved units can never be removed.
    pub fn adjust(&self, delta: i64) -> Result<StockMovement, StockError> {
        if delta == 0 {
            return Err(StockError::ZeroAdjustment);
        }
        let requested = delta.saturating_abs();
        let on_hand = self
            .on_hand
            .checked_add(delta)
            .ok_or(StockError::QuantityOutOfRange {
                on_hand: self.on_hand,
                delta,
            })?;
        if on_hand < 0 || (delta < 0 && self.available() < requested) {
            return Err(StockError::InsufficientStock {
                requested,
                available: self.available(),
            });
        }
        Ok(StockMovement {
            kind: MovementKind::Adjust,
            quantity: delta,
            on_hand_delta: delta,
            reserved_delta: 0,
        })
    }

    pub fn apply(&mut self, movement: &StockMovement) {
        self.on_hand = self.on_hand.saturating_add(movement.on_hand_delta);
        self.reserved = self.reserved.saturating_add(movement.reserved_delta);
    }
}

fn ensure_positive(qty: i64) -> Result<(), StockError> {
    if qty <= 0 {
        return Err(StockError::NonPositiveQuantity(qty));
    }
    Ok(())
}
