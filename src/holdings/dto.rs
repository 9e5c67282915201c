use serde::Deserialize;

/// Body of `POST /holdings`. The owner is always the authenticated caller.
#[derive(Debug, Deserialize)]
pub struct CreateHoldingRequest {
    pub ticker_symbol: String,
    pub quantity: i64,
    pub acquisition_price: f64,
}
