use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
};

use orderflow_customers::{CustomerId, CustomerSegment};
use orderflow_infra::services::{CustomerChanges, NewCustomer};

use crate::app::routes::{respond, respond_items, respond_no_content};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_customer).get(list_customers))
        .route("/email/:email", get(get_customer_by_email))
        .route("/code/:code", get(get_customer_by_code))
        .route(
            "/:id",
            get(get_customer).patch(update_customer).delete(delete_customer),
        )
        .route("/:id/activate", post(activate_customer))
        .route("/:id/deactivate", post(deactivate_customer))
}

fn customer_id(raw: &str) -> Result<CustomerId, axum::response::Response> {
    errors::parse_id(raw).map(CustomerId::new)
}

pub async fn register_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewCustomer>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services,
        move |s| s.customers.register(body),
        dto::customer_to_json,
    )
    .await
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::CustomerListQuery>,
) -> axum::response::Response {
    let segment = match query
        .segment
        .as_deref()
        .map(errors::parse_enum::<CustomerSegment>)
        .transpose()
    {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond_items(
        services,
        move |s| match (segment, query.active) {
            (Some(segment), _) => s.customers.list_by_segment(segment),
            (None, Some(true)) => s.customers.list_active(),
            (None, _) => s.customers.list(),
        },
        dto::customer_to_json,
    )
    .await
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let customer_id = match customer_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.customers.get(customer_id),
        dto::customer_to_json,
    )
    .await
}

pub async fn get_customer_by_email(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services,
        move |s| s.customers.find_by_email(&email),
        dto::customer_to_json,
    )
    .await
}

pub async fn get_customer_by_code(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services,
        move |s| s.customers.find_by_code(&code),
        dto::customer_to_json,
    )
    .await
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<CustomerChanges>,
) -> axum::response::Response {
    let customer_id = match customer_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.customers.update(customer_id, body),
        dto::customer_to_json,
    )
    .await
}

pub async fn activate_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(services, id, true).await
}

pub async fn deactivate_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(services, id, false).await
}

async fn set_active(
    services: Arc<AppServices>,
    id: String,
    active: bool,
) -> axum::response::Response {
    let customer_id = match customer_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.customers.set_active(customer_id, active),
        dto::customer_to_json,
    )
    .await
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let customer_id = match customer_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond_no_content(services, move |s| s.customers.delete(customer_id)).await
}
