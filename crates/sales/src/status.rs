//! Order status machine.

use serde::{Deserialize, Serialize};

use orderflow_core::{DomainError, TransitionTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

/// Allowed order status transitions. Everything else is rejected.
pub const ORDER_TRANSITIONS: TransitionTable<OrderStatus> = TransitionTable::new(&[
    (OrderStatus::Pending, OrderStatus::Confirmed),
    (OrderStatus::Pending, OrderStatus::Cancelled),
    (OrderStatus::Confirmed, OrderStatus::Processing),
    (OrderStatus::Confirmed, OrderStatus::Cancelled),
    (OrderStatus::Processing, OrderStatus::Shipped),
    (OrderStatus::Processing, OrderStatus::Cancelled),
    (OrderStatus::Shipped, OrderStatus::Delivered),
    (OrderStatus::Shipped, OrderStatus::Refunded),
]);

/// What happens to an order's stock when it is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDisposition {
    /// Units are still only reserved: release the reservations.
    ReleaseReservations,
    /// Units were committed on confirmation: put them back on hand.
    ReturnToStock,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        ORDER_TRANSITIONS.allows(self, to)
    }

    pub fn is_terminal(self) -> bool {
        ORDER_TRANSITIONS.is_terminal(self)
    }

    /// Orders in these states can be invoiced.
    pub fn is_invoiceable(self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmed
                | OrderStatus::Processing
                | OrderStatus::Shipped
                | OrderStatus::Delivered
        )
    }

    /// Stock is committed when an order leaves PENDING for CONFIRMED.
    pub fn commits_stock(from: OrderStatus, to: OrderStatus) -> bool {
        from == OrderStatus::Pending && to == OrderStatus::Confirmed
    }

    /// Stock handling when cancelling from this status, `None` if the order
    /// cannot be cancelled with stock still attached.
    pub fn stock_on_cancel(self) -> Option<StockDisposition> {
        match self {
            OrderStatus::Pending => Some(StockDisposition::ReleaseReservations),
            OrderStatus::Confirmed | OrderStatus::Processing => {
                Some(StockDisposition::ReturnToStock)
            }
            _ => None,
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| DomainError::invalid_request(format!("unknown order status: {s}")))
    }
}
