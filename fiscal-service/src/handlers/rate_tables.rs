use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use super::{location, validated_json};
use crate::dtos::{ExistsResponse, RateTableRequest, RateTableResponse};
use crate::AppState;

pub async fn list_rate_tables(
    State(state): State<AppState>,
) -> Result<Json<Vec<RateTableResponse>>, AppError> {
    let rate_tables = state.rate_tables.list().await?;
    Ok(Json(
        rate_tables.into_iter().map(RateTableResponse::from).collect(),
    ))
}

pub async fn get_rate_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RateTableResponse>, AppError> {
    Ok(Json(state.rate_tables.get(&id).await?.into()))
}

pub async fn get_rate_table_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RateTableResponse>, AppError> {
    Ok(Json(state.rate_tables.get_by_code(&code).await?.into()))
}

pub async fn rate_table_code_exists(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ExistsResponse>, AppError> {
    let exists = state.rate_tables.exists_by_code(&code).await?;
    Ok(Json(ExistsResponse { exists }))
}

#[tracing::instrument(skip(state, body))]
pub async fn create_rate_table(
    State(state): State<AppState>,
    body: Result<Json<RateTableRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = validated_json(body)?;
    let rate_table = state.rate_tables.create(request.into_model()).await?;

    Ok((
        StatusCode::CREATED,
        location("rate-tables", &rate_table.id),
        Json(RateTableResponse::from(rate_table)),
    ))
}

#[tracing::instrument(skip(state, body))]
pub async fn update_rate_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<RateTableRequest>, JsonRejection>,
) -> Result<Json<RateTableResponse>, AppError> {
    let request = validated_json(body)?;
    let rate_table = state.rate_tables.update(&id, request.into_model()).await?;
    Ok(Json(rate_table.into()))
}

#[tracing::instrument(skip(state))]
pub async fn delete_rate_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.rate_tables.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rate_table_exists(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExistsResponse>, AppError> {
    let exists = state.rate_tables.exists(&id).await?;
    Ok(Json(ExistsResponse { exists }))
}
