use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, patch, post},
};

use orderflow_infra::services::PaymentRequest;
use orderflow_invoicing::InvoiceId;
use orderflow_payments::{PaymentId, PaymentStatus};

use crate::app::routes::{respond, respond_items};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(process_payment).get(list_payments))
        .route("/reference/:reference", get(get_payment_by_reference))
        .route("/:id", get(get_payment))
        .route("/:id/status", patch(update_payment_status))
}

fn payment_id(raw: &str) -> Result<PaymentId, axum::response::Response> {
    errors::parse_id(raw).map(PaymentId::new)
}

pub async fn process_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<PaymentRequest>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services,
        move |s| s.payments.process(body),
        dto::payment_to_json,
    )
    .await
}

pub async fn list_payments(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::PaymentListQuery>,
) -> axum::response::Response {
    let status = match query
        .status
        .as_deref()
        .map(errors::parse_enum::<PaymentStatus>)
        .transpose()
    {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond_items(
        services,
        move |s| {
            if let Some(status) = status {
                s.payments.list_by_status(status)
            } else if let Some(invoice_id) = query.invoice_id {
                s.payments.list_for_invoice(InvoiceId::from(invoice_id))
            } else {
                s.payments.list()
            }
        },
        dto::payment_to_json,
    )
    .await
}

pub async fn get_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let payment_id = match payment_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.payments.get(payment_id),
        dto::payment_to_json,
    )
    .await
}

pub async fn get_payment_by_reference(
    Extension(services): Extension<Arc<AppServices>>,
    Path(reference): Path<String>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services,
        move |s| s.payments.find_by_reference(&reference),
        dto::payment_to_json,
    )
    .await
}

pub async fn update_payment_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::StatusRequest>,
) -> axum::response::Response {
    let payment_id = match payment_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match errors::parse_enum::<PaymentStatus>(&body.status) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.payments.update_status(payment_id, status),
        dto::payment_to_json,
    )
    .await
}
