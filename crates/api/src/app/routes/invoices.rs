use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, patch, post},
};
use chrono::Utc;

use orderflow_customers::CustomerId;
use orderflow_invoicing::{InvoiceId, InvoiceStatus};
use orderflow_sales::OrderId;

use crate::app::routes::{respond, respond_items};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_invoices))
        .route("/overdue", get(overdue_invoices))
        .route("/generate/:order_id", post(generate_invoice))
        .route("/number/:number", get(get_invoice_by_number))
        .route("/order/:order_id", get(get_invoice_for_order))
        .route("/:id", get(get_invoice))
        .route("/:id/status", patch(update_invoice_status))
        .route("/:id/mark-paid", post(mark_invoice_paid))
        .route("/:id/payments", get(invoice_payments))
}

fn invoice_id(raw: &str) -> Result<InvoiceId, axum::response::Response> {
    errors::parse_id(raw).map(InvoiceId::new)
}

pub async fn generate_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<String>,
) -> axum::response::Response {
    let order_id = match errors::parse_id(&order_id) {
        Ok(v) => OrderId::new(v),
        Err(resp) => return resp,
    };
    respond(
        StatusCode::CREATED,
        services,
        move |s| s.billing.generate_for_order(order_id),
        dto::invoice_to_json,
    )
    .await
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::InvoiceListQuery>,
) -> axum::response::Response {
    respond_items(
        services,
        move |s| match query.customer_id {
            Some(customer_id) => s.billing.list_by_customer(CustomerId::from(customer_id)),
            None => s.billing.list(),
        },
        dto::invoice_to_json,
    )
    .await
}

pub async fn overdue_invoices(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let today = Utc::now().date_naive();
    respond_items(services, move |s| s.billing.list_overdue(today), dto::invoice_to_json).await
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id = match invoice_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.billing.get(invoice_id),
        dto::invoice_to_json,
    )
    .await
}

pub async fn get_invoice_by_number(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services,
        move |s| s.billing.find_by_number(&number),
        dto::invoice_to_json,
    )
    .await
}

pub async fn get_invoice_for_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<String>,
) -> axum::response::Response {
    let order_id = match errors::parse_id(&order_id) {
        Ok(v) => OrderId::new(v),
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.billing.find_for_order(order_id),
        dto::invoice_to_json,
    )
    .await
}

pub async fn update_invoice_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::StatusRequest>,
) -> axum::response::Response {
    let invoice_id = match invoice_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match errors::parse_enum::<InvoiceStatus>(&body.status) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.billing.update_status(invoice_id, status),
        dto::invoice_to_json,
    )
    .await
}

pub async fn mark_invoice_paid(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id = match invoice_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.billing.mark_as_paid(invoice_id),
        dto::invoice_to_json,
    )
    .await
}

pub async fn invoice_payments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id = match invoice_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond_items(
        services,
        move |s| s.payments.list_for_invoice(invoice_id),
        dto::payment_to_json,
    )
    .await
}
