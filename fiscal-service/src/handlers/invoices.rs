use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use super::{location, validated_json};
use crate::dtos::{ExistsResponse, InvoiceRequest, InvoiceResponse, TotalResponse};
use crate::AppState;

pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let invoices = state.invoices.list().await?;
    Ok(Json(invoices.into_iter().map(InvoiceResponse::from).collect()))
}

pub async fn list_invoices_by_practitioner(
    State(state): State<AppState>,
    Path(practitioner_id): Path<String>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let invoices = state.invoices.list_by_practitioner(&practitioner_id).await?;
    Ok(Json(invoices.into_iter().map(InvoiceResponse::from).collect()))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state.invoices.get(&id).await?;
    Ok(Json(invoice.into()))
}

#[tracing::instrument(skip(state, body))]
pub async fn create_invoice(
    State(state): State<AppState>,
    body: Result<Json<InvoiceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = validated_json(body)?;
    let invoice = state.invoices.create(request.into_model()).await?;

    Ok((
        StatusCode::CREATED,
        location("invoices", &invoice.id),
        Json(InvoiceResponse::from(invoice)),
    ))
}

#[tracing::instrument(skip(state, body))]
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<InvoiceRequest>, JsonRejection>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let request = validated_json(body)?;
    let invoice = state.invoices.update(&id, request.into_model()).await?;
    Ok(Json(invoice.into()))
}

#[tracing::instrument(skip(state))]
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.invoices.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn invoice_exists(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExistsResponse>, AppError> {
    let exists = state.invoices.exists(&id).await?;
    Ok(Json(ExistsResponse { exists }))
}

pub async fn invoice_total(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TotalResponse>, AppError> {
    let total = state.invoices.line_total(&id).await?;
    Ok(Json(TotalResponse { id, total }))
}
