use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::Owner;
use crate::errors::TrackerError;
use crate::ledger::LedgerOutcome;
use crate::models::{OpenPosition, Position, PositionAdjustment, Symbol, Transaction, Valuation};
use crate::AppState;

use super::ApiResponse;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AddPositionRequest {
    pub symbol: String,
    pub quantity: i64,
    pub purchase_price: Decimal,
}

#[derive(Deserialize)]
pub struct UpdatePositionRequest {
    pub quantity: Option<i64>,
    pub purchase_price: Option<Decimal>,
}

#[derive(Deserialize)]
pub struct TransactionsQuery {
    pub symbol: Option<String>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, TrackerError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|e| TrackerError::Validation(e.body_text()))
}

fn position_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, TrackerError> {
    path.map(|Path(id)| id)
        .map_err(|e| TrackerError::Validation(e.body_text()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/positions: the owner's open lots
pub async fn list(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> Result<Json<ApiResponse<Vec<Position>>>, TrackerError> {
    let positions = state.ledger.list_positions(owner_id, state.deadline()).await?;
    Ok(Json(ApiResponse::ok(positions)))
}

/// GET /api/positions/{id}
pub async fn detail(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<Position>>, TrackerError> {
    let id = position_id(path)?;
    let position = state.ledger.get_position(owner_id, id, state.deadline()).await?;
    Ok(Json(ApiResponse::ok(position)))
}

/// POST /api/positions: open a lot and record the buy
pub async fn add(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    payload: Result<Json<AddPositionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<LedgerOutcome>>), TrackerError> {
    let req = body(payload)?;
    let open = OpenPosition::new(&req.symbol, req.quantity, req.purchase_price)?;

    let outcome = state.ledger.add_position(owner_id, &open, state.deadline()).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(outcome))))
}

/// PUT /api/positions/{id}: adjust quantity and/or price
pub async fn update(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdatePositionRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LedgerOutcome>>, TrackerError> {
    let id = position_id(path)?;
    let req = body(payload)?;
    let adjustment = PositionAdjustment::new(req.quantity, req.purchase_price)?;

    let outcome = state
        .ledger
        .update_position(owner_id, id, &adjustment, state.deadline())
        .await?;

    Ok(Json(ApiResponse::ok(outcome)))
}

/// DELETE /api/positions/{id}: close the lot and record the sell
pub async fn remove(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<LedgerOutcome>>, TrackerError> {
    let id = position_id(path)?;
    let outcome = state.ledger.remove_position(owner_id, id, state.deadline()).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// GET /api/portfolio: positions with current price and unrealized P&L
pub async fn portfolio(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> Result<Json<ApiResponse<Vec<Valuation>>>, TrackerError> {
    let valuations = state.valuations.get_valuation(owner_id, state.deadline()).await?;
    Ok(Json(ApiResponse::ok(valuations)))
}

/// GET /api/transactions: ledger history, newest first
pub async fn transactions(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, TrackerError> {
    let symbol = query.symbol.as_deref().map(Symbol::parse).transpose()?;

    let transactions = state
        .ledger
        .list_transactions(owner_id, symbol.as_ref().map(Symbol::as_str), state.deadline())
        .await?;

    Ok(Json(ApiResponse::ok(transactions)))
}
