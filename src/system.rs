use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::{auth::extractors::Caller, state::AppState};

#[derive(Debug, Serialize)]
pub struct Banner {
    pub message: &'static str,
    pub version: &'static str,
    pub user: Option<String>,
}

pub fn system_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
}

pub async fn root(caller: Caller) -> Json<Banner> {
    Json(Banner {
        message: "InvestFolio API is running",
        version: env!("CARGO_PKG_VERSION"),
        user: caller.user().map(|u| u.username.clone()),
    })
}
