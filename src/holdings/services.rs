use tracing::info;

use super::{
    dto::CreateHoldingRequest,
    repo::HoldingRepository,
    repo_types::{Holding, NewHolding},
};
use crate::{
    auth::repo_types::User,
    error::{AppError, AppResult},
};

const TICKER_MAX_LEN: usize = 20;

pub fn validate(req: CreateHoldingRequest) -> AppResult<NewHolding> {
    let ticker_symbol = req.ticker_symbol.trim().to_uppercase();
    if ticker_symbol.is_empty() {
        return Err(AppError::InvalidPayload("ticker_symbol must not be empty".into()));
    }
    if ticker_symbol.chars().count() > TICKER_MAX_LEN {
        return Err(AppError::InvalidPayload(format!(
            "ticker_symbol must be at most {TICKER_MAX_LEN} characters"
        )));
    }

    let quantity = i32::try_from(req.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| AppError::InvalidPayload("quantity must be greater than 0".into()))?;

    if !req.acquisition_price.is_finite() || req.acquisition_price <= 0.0 {
        return Err(AppError::InvalidPayload(
            "acquisition_price must be greater than 0".into(),
        ));
    }

    Ok(NewHolding {
        ticker_symbol,
        quantity,
        acquisition_price: req.acquisition_price,
    })
}

/// Records a holding for the authenticated `owner`.
pub async fn create_holding(
    holdings: &dyn HoldingRepository,
    owner: &User,
    req: CreateHoldingRequest,
) -> AppResult<Holding> {
    let new = validate(req)?;
    let holding = holdings.create(owner.id, new).await?;
    info!(
        user_id = %owner.id,
        holding_id = %holding.id,
        ticker = %holding.ticker_symbol,
        "holding created"
    );
    Ok(holding)
}

pub async fn list_holdings(holdings: &dyn HoldingRepository, owner: &User) -> AppResult<Vec<Holding>> {
    Ok(holdings.list_by_owner(owner.id).await?)
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::holdings::memory::InMemoryHoldingRepository;

    fn user(name: &str) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            username: name.into(),
            email: format!("{name}@x.com"),
            password_hash: "$argon2id$fake".into(),
            full_name: None,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn req(ticker: &str, quantity: i64, price: f64) -> CreateHoldingRequest {
        CreateHoldingRequest {
            ticker_symbol: ticker.into(),
            quantity,
            acquisition_price: price,
        }
    }

    #[test]
    fn validate_normalizes_ticker() {
        let new = validate(req("  aapl ", 10, 150.5)).expect("valid");
        assert_eq!(new.ticker_symbol, "AAPL");
        assert_eq!(new.quantity, 10);
        assert_eq!(new.acquisition_price, 150.5);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cases = [
            req("", 1, 1.0),
            req("   ", 1, 1.0),
            req(&"X".repeat(21), 1, 1.0),
            req("AAPL", 0, 1.0),
            req("AAPL", -3, 1.0),
            req("AAPL", i64::from(i32::MAX) + 1, 1.0),
            req("AAPL", 1, 0.0),
            req("AAPL", 1, -2.5),
            req("AAPL", 1, f64::NAN),
            req("AAPL", 1, f64::INFINITY),
        ];
        for case in cases {
            assert!(matches!(validate(case), Err(AppError::InvalidPayload(_))));
        }
    }

    #[tokio::test]
    async fn create_scopes_to_owner() {
        let repo = InMemoryHoldingRepository::new();
        let alice = user("alice");
        let holding = create_holding(&repo, &alice, req("AAPL", 10, 150.5))
            .await
            .expect("create");
        assert_eq!(holding.owner_id, alice.id);
        assert_eq!(holding.ticker_symbol, "AAPL");
    }

    #[tokio::test]
    async fn list_is_isolated_per_owner() {
        let repo = InMemoryHoldingRepository::new();
        let alice = user("alice");
        let bob = user("bob");
        create_holding(&repo, &alice, req("AAPL", 10, 150.5)).await.expect("create");
        create_holding(&repo, &alice, req("MSFT", 2, 300.0)).await.expect("create");
        create_holding(&repo, &bob, req("TSLA", 1, 200.0)).await.expect("create");

        let alices = list_holdings(&repo, &alice).await.expect("list");
        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|h| h.owner_id == alice.id));

        let bobs = list_holdings(&repo, &bob).await.expect("list");
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].ticker_symbol, "TSLA");

        assert!(list_holdings(&repo, &user("carol")).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let repo = InMemoryHoldingRepository::new();
        let alice = user("alice");
        for ticker in ["AAA", "BBB", "CCC"] {
            create_holding(&repo, &alice, req(ticker, 1, 1.0)).await.expect("create");
        }
        let tickers: Vec<_> = list_holdings(&repo, &alice)
            .await
            .expect("list")
            .into_iter()
            .map(|h| h.ticker_symbol)
            .collect();
        assert_eq!(tickers, ["CCC", "BBB", "AAA"]);
    }
}
