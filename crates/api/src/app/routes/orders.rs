use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, patch, post},
};

use orderflow_customers::CustomerId;
use orderflow_infra::services::PlaceOrderRequest;
use orderflow_sales::{OrderId, OrderStatus};

use crate::app::routes::{respond, respond_items};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(place_order).get(list_orders))
        .route("/number/:number", get(get_order_by_number))
        .route("/:id", get(get_order))
        .route("/:id/status", patch(update_order_status))
        .route("/:id/cancel", post(cancel_order))
}

fn order_id(raw: &str) -> Result<OrderId, axum::response::Response> {
    errors::parse_id(raw).map(OrderId::new)
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<PlaceOrderRequest>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services,
        move |s| s.orders.place_order(body),
        dto::order_to_json,
    )
    .await
}

/// Filters apply in priority order: status, customer, date range.
pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::OrderListQuery>,
) -> axum::response::Response {
    let status = match query
        .status
        .as_deref()
        .map(errors::parse_enum::<OrderStatus>)
        .transpose()
    {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond_items(
        services,
        move |s| {
            if let Some(status) = status {
                s.orders.list_by_status(status)
            } else if let Some(customer_id) = query.customer_id {
                s.orders.list_by_customer(CustomerId::from(customer_id))
            } else if let (Some(from), Some(to)) = (query.from, query.to) {
                s.orders.list_between(from, to)
            } else {
                s.orders.list()
            }
        },
        dto::order_to_json,
    )
    .await
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.orders.get(order_id),
        dto::order_to_json,
    )
    .await
}

pub async fn get_order_by_number(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services,
        move |s| s.orders.find_by_number(&number),
        dto::order_to_json,
    )
    .await
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::StatusRequest>,
) -> axum::response::Response {
    let order_id = match order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match errors::parse_enum::<OrderStatus>(&body.status) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.orders.update_status(order_id, status),
        dto::order_to_json,
    )
    .await
}

pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Option<Json<dto::CancelOrderRequest>>,
) -> axum::response::Response {
    let order_id = match order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let reason = body.and_then(|Json(b)| b.reason);
    respond(
        StatusCode::OK,
        services,
        move |s| s.orders.cancel(order_id, reason),
        dto::order_to_json,
    )
    .await
}
