use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{dto::CreateHoldingRequest, repo_types::Holding, services};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn holdings_routes() -> Router<AppState> {
    Router::new().route("/holdings", get(list_holdings).post(create_holding))
}

#[instrument(skip_all)]
pub async fn list_holdings(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<Holding>>> {
    let items = services::list_holdings(state.holdings.as_ref(), &user).await?;
    Ok(Json(items))
}

#[instrument(skip_all)]
pub async fn create_holding(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateHoldingRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Holding>)> {
    let Json(payload) = payload.map_err(|e| AppError::InvalidPayload(e.body_text()))?;
    let holding = services::create_holding(state.holdings.as_ref(), &user, payload).await?;
    Ok((StatusCode::CREATED, Json(holding)))
}
