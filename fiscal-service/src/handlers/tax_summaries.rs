use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use super::{location, validated_json};
use crate::dtos::{
    ComputeParams, ExistsResponse, PeriodParams, TaxSummaryRequest, TaxSummaryResponse,
};
use crate::AppState;

pub async fn list_tax_summaries(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaxSummaryResponse>>, AppError> {
    let summaries = state.tax_summaries.list().await?;
    Ok(Json(
        summaries.into_iter().map(TaxSummaryResponse::from).collect(),
    ))
}

pub async fn list_tax_summaries_by_practitioner(
    State(state): State<AppState>,
    Path(practitioner_id): Path<String>,
) -> Result<Json<Vec<TaxSummaryResponse>>, AppError> {
    let summaries = state
        .tax_summaries
        .list_by_practitioner(&practitioner_id)
        .await?;
    Ok(Json(
        summaries.into_iter().map(TaxSummaryResponse::from).collect(),
    ))
}

pub async fn get_tax_summary_by_period(
    State(state): State<AppState>,
    Path(practitioner_id): Path<String>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<TaxSummaryResponse>, AppError> {
    let summary = state
        .tax_summaries
        .get_by_period(&practitioner_id, params.month, params.year)
        .await?;
    Ok(Json(summary.into()))
}

pub async fn get_tax_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaxSummaryResponse>, AppError> {
    Ok(Json(state.tax_summaries.get(&id).await?.into()))
}

#[tracing::instrument(skip(state, body))]
pub async fn create_tax_summary(
    State(state): State<AppState>,
    body: Result<Json<TaxSummaryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = validated_json(body)?;
    let summary = state.tax_summaries.create(request.into_model()).await?;

    Ok((
        StatusCode::CREATED,
        location("tax-summaries", &summary.id),
        Json(TaxSummaryResponse::from(summary)),
    ))
}

#[tracing::instrument(skip(state, body))]
pub async fn update_tax_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TaxSummaryRequest>, JsonRejection>,
) -> Result<Json<TaxSummaryResponse>, AppError> {
    let request = validated_json(body)?;
    let summary = state.tax_summaries.update(&id, request.into_model()).await?;
    Ok(Json(summary.into()))
}

#[tracing::instrument(skip(state))]
pub async fn delete_tax_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.tax_summaries.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn tax_summary_exists(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExistsResponse>, AppError> {
    let exists = state.tax_summaries.exists(&id).await?;
    Ok(Json(ExistsResponse { exists }))
}

/// Recomputes and stores the summary for one practitioner-month.
#[tracing::instrument(skip(state))]
pub async fn compute_tax_summary(
    State(state): State<AppState>,
    Query(params): Query<ComputeParams>,
) -> Result<Json<TaxSummaryResponse>, AppError> {
    let summary = state
        .tax_summaries
        .compute_summary(&params.practitioner_id, params.month, params.year)
        .await?;
    Ok(Json(summary.into()))
}
