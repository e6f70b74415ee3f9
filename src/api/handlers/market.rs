use axum::extract::{Path, State};
use axum::Json;

use crate::errors::TrackerError;
use crate::market::{History, Quote};
use crate::models::Symbol;
use crate::AppState;

use super::ApiResponse;

/// GET /api/prices/{symbol}: latest quote, cached
pub async fn price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<Quote>>, TrackerError> {
    let symbol = Symbol::parse(&symbol)?;
    let quote = state.quotes.get_quote(&symbol, state.deadline()).await?;
    Ok(Json(ApiResponse::ok(quote)))
}

/// GET /api/history/{symbol}: daily closes, oldest first
pub async fn history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<History>>, TrackerError> {
    let symbol = Symbol::parse(&symbol)?;
    let history = state.history.get_history(&symbol, state.deadline()).await?;
    Ok(Json(ApiResponse::ok(history)))
}
