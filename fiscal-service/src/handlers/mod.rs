pub mod bills;
pub mod health;
pub mod invoices;
pub mod queue;
pub mod rate_tables;
pub mod tax_summaries;

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderMap, HeaderValue},
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// Unwraps a JSON body and runs its field validators.
///
/// Malformed or mistyped bodies are reported as 400 rather than axum's 422.
pub(crate) fn validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(payload) =
        body.map_err(|rejection| AppError::BadRequest(anyhow::anyhow!(rejection.body_text())))?;
    payload.validate()?;
    Ok(payload)
}

/// `Location` header for a newly created resource.
pub(crate) fn location(collection: &str, id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format!("/{}/{}", collection, id)) {
        headers.insert(header::LOCATION, value);
    }
    headers
}
