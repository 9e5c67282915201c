use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use super::{
    quotes::{StockQuote, NINTENDO_SYMBOL},
    rates::ExchangeRate,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn market_routes() -> Router<AppState> {
    Router::new()
        .route("/stocks/nintendo", get(nintendo_quote))
        .route("/exchange-rates/usd-jpy", get(usd_jpy_rate))
}

#[derive(Debug, Serialize)]
pub struct StockQuoteResponse {
    #[serde(flatten)]
    pub quote: StockQuote,
    pub message: String,
}

impl From<StockQuote> for StockQuoteResponse {
    fn from(quote: StockQuote) -> Self {
        let message = quote.summary();
        Self { quote, message }
    }
}

#[instrument(skip_all)]
pub async fn nintendo_quote(State(state): State<AppState>) -> AppResult<Json<StockQuoteResponse>> {
    let quote = state
        .quotes
        .quote(NINTENDO_SYMBOL)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock not found".into()))?;
    Ok(Json(quote.into()))
}

#[instrument(skip_all)]
pub async fn usd_jpy_rate(State(state): State<AppState>) -> AppResult<Json<ExchangeRate>> {
    let rate = state.rates.usd_jpy().await?;
    Ok(Json(ExchangeRate::usd_jpy(rate)))
}
