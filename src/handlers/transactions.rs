use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppError,
    models::transaction::{
        CreateTransactionRequest, ListAllParams, PaginatedTransactions, TransactionListParams,
        TransactionStatistics, TransactionView, UpdateTransactionRequest,
    },
    validate, AppState,
};

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<TransactionListParams>,
) -> Result<Json<PaginatedTransactions>, AppError> {
    let query = validate::list_query(params)?;
    Ok(Json(state.transactions.list(query).await?))
}

pub async fn list_all(
    State(state): State<AppState>,
    Query(params): Query<ListAllParams>,
) -> Result<Json<PaginatedTransactions>, AppError> {
    Ok(Json(state.transactions.list_all(params.page, params.limit).await?))
}

pub async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<TransactionStatistics>, AppError> {
    Ok(Json(state.transactions.statistics().await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TransactionView>, AppError> {
    Ok(Json(state.transactions.get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionView>), AppError> {
    let input = validate::create(payload)?;
    let created = state.transactions.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> Result<Json<TransactionView>, AppError> {
    let patch = validate::update(payload)?;
    Ok(Json(state.transactions.update(&id, patch).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.transactions.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
