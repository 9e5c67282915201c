use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod quotes;
pub mod rates;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::market_routes())
}
