//! Order lifecycle engine.
//!
//! Places orders against reserved stock, drives the order status machine and
//! keeps product stock counters in step with it:
//!
//! - placement reserves every line (all or nothing),
//! - PENDING → CONFIRMED commits the reserved units,
//! - cancelling releases reservations (PENDING) or puts committed units back
//!   on hand (CONFIRMED, PROCESSING).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use orderflow_core::{BusinessKeyPrefix, DomainError, Money, business_key};
use orderflow_customers::{Customer, CustomerCommand, CustomerId, RecordOrder};
use orderflow_events::EventBus;
use orderflow_products::{
    AdjustStock, CommitStock, Product, ProductCommand, ProductId, ReleaseStock, ReserveStock,
};
use orderflow_sales::{
    CancelOrder, ChangeOrderStatus, Order, OrderCommand, OrderId, OrderItem, OrderStatus,
    PlaceOrder, PricedLine, StockDisposition,
};

use crate::config::PricingPolicy;
use crate::ledger::{LedgerRecord, LedgerStore};

use super::error::ServiceError;
use super::ledger::{JsonEnvelope, Ledger, UnitOfWork};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    pub discount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: CustomerId,
    pub items: Vec<OrderLineRequest>,
    pub discount_amount: Option<Money>,
    pub notes: Option<String>,
}

pub struct OrderLifecycleEngine<S, B> {
    ledger: Arc<Ledger<S, B>>,
    pricing: PricingPolicy,
}

impl<S, B> OrderLifecycleEngine<S, B>
where
    S: LedgerStore,
    B: EventBus<JsonEnvelope>,
{
    pub fn new(ledger: Arc<Ledger<S, B>>, pricing: PricingPolicy) -> Self {
        Self { ledger, pricing }
    }

    pub fn place_order(&self, request: PlaceOrderRequest) -> Result<Order, ServiceError> {
        let tax_rate = self.pricing.tax_rate;
        let order = self.ledger.execute("orders.place", |uow| {
            let now = Utc::now();
            let mut customer = uow.load::<Customer>(request.customer_id.record_id())?;
            if !customer.is_active() {
                return Err(DomainError::invalid_request(format!(
                    "customer {} is inactive",
                    customer.customer_code()
                ))
                .into());
            }
            if request.items.is_empty() {
                return Err(DomainError::invalid_request("order must contain at least one item").into());
            }

            let mut lines = Vec::with_capacity(request.items.len());
            for item in &request.items {
                let mut product = uow.load::<Product>(item.product_id.record_id())?;
                uow.execute(
                    &mut product,
                    ProductCommand::ReserveStock(ReserveStock {
                        product_id: item.product_id,
                        quantity: item.quantity,
                        occurred_at: now,
                    }),
                )?;
                lines.push(PricedLine {
                    product_id: item.product_id,
                    product_name: product.name().to_string(),
                    product_sku: product.sku().to_string(),
                    unit_price: product.price(),
                    quantity: item.quantity,
                    discount: item.discount.unwrap_or(Decimal::ZERO),
                });
            }

            let order_id = OrderId::new(uow.next_id::<Order>());
            let mut order = Order::empty(order_id);
            uow.execute(
                &mut order,
                OrderCommand::PlaceOrder(PlaceOrder {
                    order_id,
                    order_number: business_key(BusinessKeyPrefix::Order),
                    customer_id: request.customer_id,
                    lines,
                    discount_amount: request.discount_amount.unwrap_or(Decimal::ZERO),
                    tax_rate,
                    notes: request.notes,
                    occurred_at: now,
                }),
            )?;

            uow.execute(
                &mut customer,
                CustomerCommand::RecordOrder(RecordOrder {
                    customer_id: request.customer_id,
                    order_total: order.total_amount(),
                    occurred_at: now,
                }),
            )?;
            Ok(order)
        })?;

        tracing::info!(
            order_id = %order.id_typed(),
            order_number = order.order_number(),
            customer_id = %order.customer_id(),
            total = %order.total_amount(),
            "order placed"
        );
        Ok(order)
    }

    /// Move an order along the status table. CANCELLED goes through [`Self::cancel`].
    ///
    /// Disallowed moves fail with `InvalidOrderTransition`, except CANCELLED from
    /// SHIPPED or DELIVERED, which fails with `OrderProcessing` like `cancel` does.
    pub fn update_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order, ServiceError> {
        if status == OrderStatus::Cancelled {
            return self.cancel(order_id, None);
        }

        let (order, from) = self.ledger.execute("orders.update_status", |uow| {
            let now = Utc::now();
            let mut order = uow.load::<Order>(order_id.record_id())?;
            let from = order.status();

            uow.execute(
                &mut order,
                OrderCommand::ChangeOrderStatus(ChangeOrderStatus {
                    order_id,
                    status,
                    occurred_at: now,
                }),
            )?;

            if OrderStatus::commits_stock(from, status) {
                for item in order.items() {
                    let mut product = uow.load::<Product>(item.product_id.record_id())?;
                    uow.execute(
                        &mut product,
                        ProductCommand::CommitStock(CommitStock {
                            product_id: item.product_id,
                            quantity: item.quantity,
                            occurred_at: now,
                        }),
                    )?;
                }
            }
            Ok((order, from))
        })?;

        tracing::info!(
            order_id = %order_id,
            order_number = order.order_number(),
            from = %from,
            to = %status,
            "order status changed"
        );
        Ok(order)
    }

    /// Cancel an order and give its stock back.
    pub fn cancel(&self, order_id: OrderId, reason: Option<String>) -> Result<Order, ServiceError> {
        let (order, from) = self.ledger.execute("orders.cancel", |uow| {
            let now = Utc::now();
            let mut order = uow.load::<Order>(order_id.record_id())?;
            let from = order.status();

            uow.execute(
                &mut order,
                OrderCommand::CancelOrder(CancelOrder {
                    order_id,
                    reason,
                    occurred_at: now,
                }),
            )?;

            if let Some(disposition) = from.stock_on_cancel() {
                for item in order.items() {
                    return_stock(uow, item, disposition, now)?;
                }
            }
            Ok((order, from))
        })?;

        tracing::info!(
            order_id = %order_id,
            order_number = order.order_number(),
            from = %from,
            "order cancelled"
        );
        Ok(order)
    }

    pub fn get(&self, order_id: OrderId) -> Result<Order, ServiceError> {
        self.ledger
            .read(|view| view.orders().find_by_id(order_id.record_id()))?
            .ok_or_else(|| DomainError::not_found(Order::ENTITY, order_id).into())
    }

    pub fn find_by_number(&self, order_number: &str) -> Result<Order, ServiceError> {
        self.ledger
            .read(|view| view.orders().find_by_key(order_number))?
            .ok_or_else(|| DomainError::not_found(Order::ENTITY, order_number).into())
    }

    pub fn list(&self) -> Result<Vec<Order>, ServiceError> {
        self.ledger.read(|view| view.orders().all())
    }

    pub fn list_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>, ServiceError> {
        self.ledger
            .read(|view| view.orders().find_where(&|o: &Order| o.customer_id() == customer_id))
    }

    pub fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, ServiceError> {
        self.ledger
            .read(|view| view.orders().find_where(&|o: &Order| o.status() == status))
    }

    /// Orders placed within `[from, to]`.
    pub fn list_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Order>, ServiceError> {
        self.ledger.read(|view| {
            view.orders()
                .find_where(&|o: &Order| o.order_date().is_some_and(|d| d >= from && d <= to))
        })
    }
}

fn return_stock(
    uow: &mut UnitOfWork<'_>,
    item: &OrderItem,
    disposition: StockDisposition,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let Some(mut product) = uow.find::<Product>(item.product_id.record_id()) else {
        tracing::warn!(
            product_id = %item.product_id,
            sku = %item.product_sku,
            "product no longer in catalog; stock not returned"
        );
        return Ok(());
    };

    let command = match disposition {
        StockDisposition::ReleaseReservations => ProductCommand::ReleaseStock(ReleaseStock {
            product_id: item.product_id,
            quantity: item.quantity,
            occurred_at: now,
        }),
        StockDisposition::ReturnToStock => ProductCommand::AdjustStock(AdjustStock {
            product_id: item.product_id,
            delta: item.quantity,
            occurred_at: now,
        }),
    };
    uow.execute(&mut product, command)
}
