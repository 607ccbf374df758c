use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderflow_core::{Aggregate, AggregateRoot, DomainError, Money, RecordMeta, record_id_newtype};
use orderflow_customers::CustomerId;
use orderflow_events::Event;

use crate::pricing::{OrderItem, OrderTotals, PricedLine, compute_totals, price_lines};
use crate::status::OrderStatus;

record_id_newtype!(
    /// Order identifier.
    OrderId
);

/// Aggregate root: Order.
///
/// Owns its items exclusively. Stock reservations for the items are held on
/// the products and coordinated by the order lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    order_number: String,
    customer_id: CustomerId,
    items: Vec<OrderItem>,
    status: OrderStatus,
    totals: OrderTotals,
    order_date: Option<DateTime<Utc>>,
    notes: Option<String>,
    meta: RecordMeta,
    version: u64,
    created: bool,
}

impl Order {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            order_number: String::new(),
            customer_id: CustomerId::default(),
            items: Vec::new(),
            status: OrderStatus::Pending,
            totals: OrderTotals::default(),
            order_date: None,
            notes: None,
            meta: RecordMeta::default(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn totals(&self) -> OrderTotals {
        self.totals
    }

    pub fn subtotal(&self) -> Money {
        self.totals.subtotal
    }

    pub fn tax_amount(&self) -> Money {
        self.totals.tax_amount
    }

    pub fn discount_amount(&self) -> Money {
        self.totals.discount_amount
    }

    pub fn total_amount(&self) -> Money {
        self.totals.total_amount
    }

    pub fn order_date(&self) -> Option<DateTime<Utc>> {
        self.order_date
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    pub fn is_deleted(&self) -> bool {
        self.meta.is_deleted()
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlaceOrder.
///
/// Lines carry the product snapshot; the caller has already reserved stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub order_id: OrderId,
    pub order_number: String,
    pub customer_id: CustomerId,
    pub lines: Vec<PricedLine>,
    pub discount_amount: Money,
    pub tax_rate: Decimal,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeOrderStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOrderStatus {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    PlaceOrder(PlaceOrder),
    ChangeOrderStatus(ChangeOrderStatus),
    CancelOrder(CancelOrder),
}

/// Event: OrderPlaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub order_number: String,
    pub customer_id: CustomerId,
    pub items: Vec<OrderItem>,
    pub totals: OrderTotals,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderPlaced(OrderPlaced),
    OrderStatusChanged(OrderStatusChanged),
    OrderCancelled(OrderCancelled),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "sales.order.placed",
            OrderEvent::OrderStatusChanged(_) => "sales.order.status_changed",
            OrderEvent::OrderCancelled(_) => "sales.order.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(e) => e.occurred_at,
            OrderEvent::OrderStatusChanged(e) => e.occurred_at,
            OrderEvent::OrderCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderPlaced(e) => {
                self.id = e.order_id;
                self.order_number = e.order_number.clone();
                self.customer_id = e.customer_id;
                self.items = e.items.clone();
                self.totals = e.totals;
                self.status = OrderStatus::Pending;
                self.order_date = Some(e.occurred_at);
                self.notes = e.notes.clone();
                self.meta = RecordMeta::created(e.occurred_at);
                self.created = true;
            }
            OrderEvent::OrderStatusChanged(e) => {
                self.status = e.to;
                self.meta.touch(e.occurred_at);
            }
            OrderEvent::OrderCancelled(e) => {
                self.status = OrderStatus::Cancelled;
                if e.reason.is_some() {
                    self.notes = e.reason.clone();
                }
                self.meta.touch(e.occurred_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            OrderCommand::ChangeOrderStatus(cmd) if cmd.status == OrderStatus::Cancelled => {
                self.handle_cancel(&CancelOrder {
                    order_id: cmd.order_id,
                    reason: None,
                    occurred_at: cmd.occurred_at,
                })
            }
            OrderCommand::ChangeOrderStatus(cmd) => self.handle_change_status(cmd),
            OrderCommand::CancelOrder(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Order {
    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_live(&self, order_id: OrderId) -> Result<(), DomainError> {
        if !self.created || self.meta.is_deleted() {
            return Err(DomainError::not_found("order", order_id));
        }
        self.ensure_order_id(order_id)
    }

    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        if cmd.order_number.trim().is_empty() {
            return Err(DomainError::invalid_request("order number cannot be empty"));
        }

        let items = price_lines(&cmd.lines)?;
        let totals = compute_totals(&items, cmd.tax_rate, cmd.discount_amount)?;

        Ok(vec![OrderEvent::OrderPlaced(OrderPlaced {
            order_id: cmd.order_id,
            order_number: cmd.order_number.clone(),
            customer_id: cmd.customer_id,
            items,
            totals,
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(
        &self,
        cmd: &ChangeOrderStatus,
    ) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_live(cmd.order_id)?;

        if !self.status.can_transition_to(cmd.status) {
            return Err(DomainError::invalid_transition(self.status, cmd.status));
        }

        Ok(vec![OrderEvent::OrderStatusChanged(OrderStatusChanged {
            order_id: cmd.order_id,
            from: self.status,
            to: cmd.status,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelOrder) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_live(cmd.order_id)?;

        if matches!(self.status, OrderStatus::Shipped | OrderStatus::Delivered) {
            return Err(DomainError::order_processing(format!(
                "cannot cancel order {} in status {}",
                self.order_number, self.status
            )));
        }
        if !self.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(DomainError::invalid_transition(
                self.status,
                OrderStatus::Cancelled,
            ));
        }

        Ok(vec![OrderEvent::OrderCancelled(OrderCancelled {
            order_id: cmd.order_id,
            from: self.status,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
