use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A position owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Holding {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub ticker_symbol: String,
    pub quantity: i32,
    pub acquisition_price: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated insert payload. The owner is passed separately.
#[derive(Debug, Clone)]
pub struct NewHolding {
    pub ticker_symbol: String,
    pub quantity: i32,
    pub acquisition_price: f64,
}
