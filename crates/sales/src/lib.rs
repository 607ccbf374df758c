//! Sales orders domain module (event-sourced).
//!
//! Order placement, totals and the order status machine, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). Stock coordination
//! lives in the order lifecycle engine in `orderflow-infra`.

pub mod order;
pub mod pricing;
pub mod status;

pub use order::{
    CancelOrder, ChangeOrderStatus, Order, OrderCancelled, OrderCommand, OrderEvent, OrderId,
    OrderPlaced, OrderStatusChanged, PlaceOrder,
};
pub use pricing::{OrderItem, OrderTotals, PricedLine, compute_totals, price_lines};
pub use status::{ORDER_TRANSITIONS, OrderStatus, StockDisposition};
