use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use orderflow_infra::services::ServiceError;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;

pub mod customers;
pub mod invoices;
pub mod orders;
pub mod payments;
pub mod products;
pub mod system;

/// Router for every domain endpoint.
pub fn router() -> Router {
    Router::new()
        .nest("/customers", customers::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/invoices", invoices::router())
        .nest("/payments", payments::router())
}

/// Run an engine call on the blocking pool.
///
/// Engines are synchronous and hold the ledger lock for the whole operation,
/// so they never run on an async worker thread.
pub(crate) async fn run_engine<T, F>(services: Arc<AppServices>, call: F) -> Result<T, Response>
where
    F: FnOnce(&AppServices) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(move || call(&services)).await {
        Ok(result) => result.map_err(errors::service_error_to_response),
        Err(e) => {
            tracing::error!(error = %e, "engine task failed");
            Err(errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "engine task failed",
            ))
        }
    }
}

/// Run an engine call and map its record to a JSON response.
pub(crate) async fn respond<T, F>(
    status: StatusCode,
    services: Arc<AppServices>,
    call: F,
    to_json: fn(T) -> Value,
) -> Response
where
    F: FnOnce(&AppServices) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    match run_engine(services, call).await {
        Ok(value) => (status, Json(to_json(value))).into_response(),
        Err(resp) => resp,
    }
}

/// Same as [`respond`] for list queries: `{"items": [...]}`.
pub(crate) async fn respond_items<T, F>(
    services: Arc<AppServices>,
    call: F,
    to_json: fn(T) -> Value,
) -> Response
where
    F: FnOnce(&AppServices) -> Result<Vec<T>, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    match run_engine(services, call).await {
        Ok(items) => (StatusCode::OK, Json(dto::items_to_json(items, to_json))).into_response(),
        Err(resp) => resp,
    }
}

/// Engine calls with nothing to return answer 204.
pub(crate) async fn respond_no_content<F>(services: Arc<AppServices>, call: F) -> Response
where
    F: FnOnce(&AppServices) -> Result<(), ServiceError> + Send + 'static,
{
    match run_engine(services, call).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(resp) => resp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use orderflow_core::DomainError;
    use orderflow_infra::config::OrderflowConfig;

    fn services() -> Arc<AppServices> {
        Arc::new(AppServices::in_memory(&OrderflowConfig::default()))
    }

    #[tokio::test]
    async fn engine_errors_map_to_json_responses() {
        let resp = run_engine(services(), |_| -> Result<(), ServiceError> {
            Err(DomainError::not_found("order", 42).into())
        })
        .await
        .unwrap_err();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn panicking_engine_call_answers_500_and_next_call_succeeds() {
        let services = services();
        let resp = run_engine(services.clone(), |_| -> Result<(), ServiceError> {
            panic!("engine blew up")
        })
        .await
        .unwrap_err();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = respond_items(services, |s| s.catalog.list(), dto::product_to_json).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
