use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::error::UpstreamError;

pub const NINTENDO_SYMBOL: &str = "7974";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub currency: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl StockQuote {
    /// One-line summary shown by the client, e.g. `任天堂の株価は8,150円です`.
    pub fn summary(&self) -> String {
        format!(
            "{}の株価は{}円です",
            self.name,
            group_thousands(self.price.round() as i64)
        )
    }
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// `Ok(None)` when the symbol is not covered by the source.
    async fn quote(&self, symbol: &str) -> Result<Option<StockQuote>, UpstreamError>;
}

/// Fixed prices stamped with the current time. Not a live feed.
#[derive(Debug, Clone, Default)]
pub struct StaticQuoteSource;

#[async_trait]
impl QuoteSource for StaticQuoteSource {
    async fn quote(&self, symbol: &str) -> Result<Option<StockQuote>, UpstreamError> {
        let quote = match symbol {
            NINTENDO_SYMBOL => Some(StockQuote {
                symbol: NINTENDO_SYMBOL.into(),
                name: "任天堂".into(),
                price: 8150.0,
                currency: "JPY".into(),
                timestamp: OffsetDateTime::now_utc(),
            }),
            _ => None,
        };
        Ok(quote)
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn nintendo_is_quoted_in_yen() {
        let before = OffsetDateTime::now_utc();
        let quote = StaticQuoteSource
            .quote(NINTENDO_SYMBOL)
            .await
            .expect("static source never fails")
            .expect("7974 is covered");
        assert_eq!(quote.symbol, "7974");
        assert_eq!(quote.name, "任天堂");
        assert_eq!(quote.price, 8150.0);
        assert_eq!(quote.currency, "JPY");
        assert!(quote.timestamp >= before);
        assert_eq!(quote.summary(), "任天堂の株価は8,150円です");
    }

    #[tokio::test]
    async fn unknown_symbol_is_none() {
        assert_eq!(StaticQuoteSource.quote("AAPL").await, Ok(None));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(-8150), "-8,150");
    }
}
