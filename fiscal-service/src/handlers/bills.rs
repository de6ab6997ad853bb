use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use super::{location, validated_json};
use crate::dtos::{BillRequest, BillResponse, ExistsResponse, TotalResponse};
use crate::AppState;

pub async fn list_bills(State(state): State<AppState>) -> Result<Json<Vec<BillResponse>>, AppError> {
    let bills = state.bills.list().await?;
    Ok(Json(bills.into_iter().map(BillResponse::from).collect()))
}

pub async fn list_bills_by_practitioner(
    State(state): State<AppState>,
    Path(practitioner_id): Path<String>,
) -> Result<Json<Vec<BillResponse>>, AppError> {
    let bills = state.bills.list_by_practitioner(&practitioner_id).await?;
    Ok(Json(bills.into_iter().map(BillResponse::from).collect()))
}

pub async fn get_bill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BillResponse>, AppError> {
    Ok(Json(state.bills.get(&id).await?.into()))
}

#[tracing::instrument(skip(state, body))]
pub async fn create_bill(
    State(state): State<AppState>,
    body: Result<Json<BillRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = validated_json(body)?;
    let bill = state.bills.create(request.into_model()).await?;

    Ok((
        StatusCode::CREATED,
        location("bills", &bill.id),
        Json(BillResponse::from(bill)),
    ))
}

#[tracing::instrument(skip(state, body))]
pub async fn update_bill(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<BillRequest>, JsonRejection>,
) -> Result<Json<BillResponse>, AppError> {
    let request = validated_json(body)?;
    let bill = state.bills.update(&id, request.into_model()).await?;
    Ok(Json(bill.into()))
}

#[tracing::instrument(skip(state))]
pub async fn delete_bill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.bills.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bill_exists(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExistsResponse>, AppError> {
    let exists = state.bills.exists(&id).await?;
    Ok(Json(ExistsResponse { exists }))
}

pub async fn bill_total(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TotalResponse>, AppError> {
    let total = state.bills.total_value(&id).await?;
    Ok(Json(TotalResponse { id, total }))
}
