use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
};

use orderflow_infra::services::{NewProduct, ProductChanges};
use orderflow_products::ProductId;

use crate::app::routes::{respond, respond_items, respond_no_content};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/low-stock", get(low_stock_products))
        .route("/sku/:sku", get(get_product_by_sku))
        .route(
            "/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/:id/stock", post(adjust_stock))
}

fn product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    errors::parse_id(raw).map(ProductId::new)
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewProduct>,
) -> axum::response::Response {
    respond(
        StatusCode::CREATED,
        services,
        move |s| s.catalog.create(body),
        dto::product_to_json,
    )
    .await
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ProductListQuery>,
) -> axum::response::Response {
    respond_items(
        services,
        move |s| match (&query.q, query.active) {
            (Some(keyword), _) => s.catalog.search(keyword),
            (None, Some(true)) => s.catalog.list_active(),
            (None, _) => s.catalog.list(),
        },
        dto::product_to_json,
    )
    .await
}

pub async fn low_stock_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    respond_items(services, |s| s.catalog.low_stock(), dto::product_to_json).await
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.catalog.get(product_id),
        dto::product_to_json,
    )
    .await
}

pub async fn get_product_by_sku(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services,
        move |s| s.catalog.find_by_sku(&sku),
        dto::product_to_json,
    )
    .await
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<ProductChanges>,
) -> axum::response::Response {
    let product_id = match product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.catalog.update(product_id, body),
        dto::product_to_json,
    )
    .await
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond_no_content(services, move |s| s.catalog.delete(product_id)).await
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let product_id = match product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services,
        move |s| s.catalog.adjust_stock(product_id, body.delta),
        dto::product_to_json,
    )
    .await
}
