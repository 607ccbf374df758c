use serde::Deserialize;
use serde_json::{Value, json};

use chrono::{DateTime, Utc};
use orderflow_customers::{Address, Customer};
use orderflow_invoicing::Invoice;
use orderflow_payments::Payment;
use orderflow_products::Product;
use orderflow_sales::Order;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerListQuery {
    pub segment: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub active: Option<bool>,
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub customer_id: Option<u64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListQuery {
    pub customer_id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentListQuery {
    pub status: Option<String>,
    pub invoice_id: Option<u64>,
}

// -------------------------
// Response mapping
// -------------------------

fn address_to_json(address: Option<&Address>) -> Value {
    match address {
        Some(a) => json!({
            "street": a.street,
            "city": a.city,
            "state": a.state,
            "postal_code": a.postal_code,
            "country": a.country,
        }),
        None => Value::Null,
    }
}

pub fn customer_to_json(c: Customer) -> Value {
    json!({
        "id": c.id_typed(),
        "customer_code": c.customer_code(),
        "first_name": c.first_name(),
        "last_name": c.last_name(),
        "email": c.email(),
        "phone": c.phone(),
        "company_name": c.company_name(),
        "billing_address": address_to_json(c.billing_address()),
        "shipping_address": address_to_json(c.shipping_address()),
        "segment": c.segment(),
        "total_orders": c.total_orders(),
        "total_spent": c.total_spent(),
        "active": c.is_active(),
        "created_at": c.meta().created_at,
        "updated_at": c.meta().updated_at,
    })
}

pub fn product_to_json(p: Product) -> Value {
    json!({
        "id": p.id_typed(),
        "sku": p.sku(),
        "name": p.name(),
        "description": p.description(),
        "price": p.price(),
        "cost_price": p.cost_price(),
        "quantity_in_stock": p.quantity_in_stock(),
        "reserved_quantity": p.reserved_quantity(),
        "available_stock": p.available_stock(),
        "min_stock_level": p.min_stock_level(),
        "low_stock": p.is_low_stock(),
        "active": p.is_active(),
        "created_at": p.meta().created_at,
        "updated_at": p.meta().updated_at,
    })
}

pub fn order_to_json(o: Order) -> Value {
    json!({
        "id": o.id_typed(),
        "order_number": o.order_number(),
        "customer_id": o.customer_id(),
        "status": o.status(),
        "order_date": o.order_date(),
        "items": o.items(),
        "subtotal": o.subtotal(),
        "tax_amount": o.tax_amount(),
        "discount_amount": o.discount_amount(),
        "total_amount": o.total_amount(),
        "notes": o.notes(),
        "updated_at": o.meta().updated_at,
    })
}

pub fn invoice_to_json(i: Invoice) -> Value {
    json!({
        "id": i.id_typed(),
        "invoice_number": i.invoice_number(),
        "order_id": i.order_id(),
        "customer_id": i.customer_id(),
        "status": i.status(),
        "invoice_date": i.invoice_date(),
        "due_date": i.due_date(),
        "subtotal": i.subtotal(),
        "tax_amount": i.tax_amount(),
        "total_amount": i.total_amount(),
        "paid_amount": i.paid_amount(),
        "balance_amount": i.balance_amount(),
        "paid_at": i.paid_at(),
    })
}

pub fn payment_to_json(p: Payment) -> Value {
    json!({
        "id": p.id_typed(),
        "reference_number": p.reference_number(),
        "invoice_id": p.invoice_id(),
        "method": p.method(),
        "amount": p.amount(),
        "status": p.status(),
        "payment_date": p.payment_date(),
        "transaction_id": p.transaction_id(),
        "notes": p.notes(),
    })
}

pub fn items_to_json<T>(items: Vec<T>, to_json: fn(T) -> Value) -> Value {
    json!({ "items": items.into_iter().map(to_json).collect::<Vec<_>>() })
}
