use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{config::MarketConfig, error::UpstreamError};

/// Wire shape of `GET /exchange-rates/usd-jpy`. Only `last` is populated by
/// the daily feed; the quote-side fields stay `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRate {
    pub symbol: &'static str,
    pub ask: Option<String>,
    pub bid: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub last: Option<String>,
}

impl ExchangeRate {
    pub fn usd_jpy(rate: f64) -> Self {
        Self {
            symbol: "USD/JPY",
            ask: None,
            bid: None,
            high: None,
            low: None,
            last: Some(format!("{rate:.2}")),
        }
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Yen per US dollar.
    async fn usd_jpy(&self) -> Result<f64, UpstreamError>;
}

#[derive(Debug, Deserialize)]
struct FloatRatesDaily {
    jpy: Option<FloatRate>,
}

#[derive(Debug, Deserialize)]
struct FloatRate {
    rate: Option<f64>,
}

/// Client for the FloatRates daily USD feed (`{"jpy": {"rate": ..}, ..}`).
#[derive(Clone)]
pub struct FloatRatesClient {
    client: Client,
    url: String,
}

impl FloatRatesClient {
    pub fn new(cfg: &MarketConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build FloatRates http client")?;
        Ok(Self {
            client,
            url: cfg.exchange_rate_url.clone(),
        })
    }
}

#[async_trait]
impl RateSource for FloatRatesClient {
    async fn usd_jpy(&self) -> Result<f64, UpstreamError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Unavailable(format!(
                "FloatRates returned {status}"
            )));
        }

        let daily: FloatRatesDaily = response.json().await.map_err(|e| {
            if e.is_decode() {
                UpstreamError::BadResponse(e.to_string())
            } else {
                UpstreamError::Unavailable(e.to_string())
            }
        })?;

        let rate = daily
            .jpy
            .and_then(|jpy| jpy.rate)
            .filter(|r| r.is_finite() && *r > 0.0)
            .ok_or_else(|| UpstreamError::BadResponse("no JPY rate in FloatRates feed".into()))?;
        debug!(rate, "fetched USD/JPY");
        Ok(rate)
    }
}

/// Answers every request with the same outcome.
#[derive(Debug, Clone)]
pub struct FixedRateSource {
    outcome: Result<f64, UpstreamError>,
}

impl FixedRateSource {
    pub fn rate(rate: f64) -> Self {
        Self { outcome: Ok(rate) }
    }

    pub fn failing(err: UpstreamError) -> Self {
        Self { outcome: Err(err) }
    }
}

#[async_trait]
impl RateSource for FixedRateSource {
    async fn usd_jpy(&self) -> Result<f64, UpstreamError> {
        self.outcome.clone()
    }
}
