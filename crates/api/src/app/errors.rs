use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use orderflow_core::{DomainError, RecordId};
use orderflow_infra::ledger::LedgerStoreError;
use orderflow_infra::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Store(LedgerStoreError::Concurrency(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        ServiceError::Store(LedgerStoreError::UniqueViolation(msg)) => {
            json_error(StatusCode::CONFLICT, "duplicate_key", msg)
        }
        ServiceError::Serialization(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "serialization_error", msg)
        }
        ServiceError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::InvalidRequest(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_request", message)
        }
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", message)
        }
        DomainError::InvalidOrderTransition { .. } => {
            json_error(StatusCode::CONFLICT, "invalid_transition", message)
        }
        DomainError::OrderProcessing(_) => {
            json_error(StatusCode::CONFLICT, "order_processing", message)
        }
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::InvariantViolation(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", message)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a numeric path id, answering 400 on garbage.
pub fn parse_id(raw: &str) -> Result<RecordId, axum::response::Response> {
    raw.parse::<RecordId>().map_err(domain_error_to_response)
}

/// Parse a status/segment name, answering 400 on an unknown value.
pub fn parse_enum<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(domain_error_to_response)
}
