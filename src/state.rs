use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{
    jwt::JwtKeys,
    memory::InMemoryUserRepository,
    repo::{PgUserRepository, UserRepository},
};
use crate::config::AppConfig;
use crate::holdings::{
    memory::InMemoryHoldingRepository,
    repo::{HoldingRepository, PgHoldingRepository},
};
use crate::market::{
    quotes::{QuoteSource, StaticQuoteSource},
    rates::{FixedRateSource, FloatRatesClient, RateSource},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserRepository>,
    pub holdings: Arc<dyn HoldingRepository>,
    pub quotes: Arc<dyn QuoteSource>,
    pub rates: Arc<dyn RateSource>,
}

impl AppState {
    /// Connects to Postgres, applies migrations and derives the signing keys.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let jwt = JwtKeys::from_config(&config.jwt).context("load JWT settings")?;

        let db = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let rates = FloatRatesClient::new(&config.market)?;

        Ok(Self {
            config: Arc::new(config),
            jwt,
            users: Arc::new(PgUserRepository::new(db.clone())),
            holdings: Arc::new(PgHoldingRepository::new(db)),
            quotes: Arc::new(StaticQuoteSource),
            rates: Arc::new(rates),
        })
    }

    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        holdings: Arc<dyn HoldingRepository>,
        quotes: Arc<dyn QuoteSource>,
        rates: Arc<dyn RateSource>,
    ) -> anyhow::Result<Self> {
        let jwt = JwtKeys::from_config(&config.jwt)?;
        Ok(Self {
            config: Arc::new(config),
            jwt,
            users,
            holdings,
            quotes,
            rates,
        })
    }

    /// In-memory state with the fixed test configuration and a USD/JPY rate of 150.
    pub fn fake() -> Self {
        Self::from_parts(
            AppConfig::for_tests(),
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryHoldingRepository::new()),
            Arc::new(StaticQuoteSource),
            Arc::new(FixedRateSource::rate(150.0)),
        )
        .expect("test config is valid")
    }
}
