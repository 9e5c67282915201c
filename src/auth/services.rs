use anyhow::Context;
use tracing::{info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password_blocking, verify_password_blocking, DUMMY_HASH},
    repo::UserRepository,
    repo_types::{NewUser, User},
    validation::{
        is_valid_email, normalize_email, validate_full_name, validate_password,
        validate_username,
    },
};
use crate::error::{AppError, AppResult};

/// Validates, checks uniqueness, hashes and stores a new user.
pub async fn register(users: &dyn UserRepository, req: RegisterRequest) -> AppResult<User> {
    let email = normalize_email(&req.email);
    let full_name = req
        .full_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    validate_username(&req.username)?;
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    validate_password(&req.password)?;
    validate_full_name(full_name.as_deref())?;

    if users.exists_by_username(&req.username).await? {
        warn!(username = %req.username, "username already taken");
        return Err(AppError::DuplicateUsername);
    }
    if users.exists_by_email(&email).await? {
        warn!(email = %email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let password_hash = hash_password_blocking(req.password)
        .await
        .context("hash password")?;

    // The store re-checks uniqueness; a concurrent registration that won the
    // race surfaces here as Duplicate*.
    let user = users
        .create(NewUser {
            username: req.username,
            email,
            password_hash,
            full_name,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Authenticates by email and password and issues a session token.
///
/// Every failure cause maps to the same [`AppError::InvalidCredentials`].
pub async fn login(
    users: &dyn UserRepository,
    keys: &JwtKeys,
    req: LoginRequest,
) -> AppResult<(String, User)> {
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        warn!("login with malformed email");
        return Err(AppError::InvalidCredentials);
    }

    let Some(user) = users.find_by_email(&email).await? else {
        // Same Argon2 work as a real account so response time does not reveal
        // which emails are registered.
        verify_password_blocking(req.password, DUMMY_HASH.to_string())
            .await
            .context("verify password")?;
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    let ok = verify_password_blocking(req.password, user.password_hash.clone())
        .await
        .context("verify password")?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_active {
        warn!(user_id = %user.id, "login for inactive user");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.issue(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok((token, user))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{auth::memory::InMemoryUserRepository, config::AppConfig};

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&AppConfig::for_tests().jwt).expect("keys")
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice".into(),
            email: "a@x.com".into(),
            password: "Passw0rd!".into(),
            full_name: Some("Alice".into()),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_creates_active_unverified_user() {
        let repo = InMemoryUserRepository::new();
        let user = register(&repo, alice()).await.expect("register");
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.full_name.as_deref(), Some("Alice"));
        assert!(user.is_active);
        assert!(!user.is_verified);
        assert_ne!(user.password_hash, "Passw0rd!");
    }

    #[tokio::test]
    async fn register_normalizes_email() {
        let repo = InMemoryUserRepository::new();
        let mut req = alice();
        req.email = "  A@X.COM ".into();
        let user = register(&repo, req).await.expect("register");
        assert_eq!(user.email, "a@x.com");
    }

    #[tokio::test]
    async fn register_rejects_bad_shape_before_storage() {
        let repo = InMemoryUserRepository::new();

        let mut req = alice();
        req.username = "a!".into();
        assert!(matches!(register(&repo, req).await, Err(AppError::Validation(_))));

        let mut req = alice();
        req.email = "not-an-email".into();
        assert!(matches!(register(&repo, req).await, Err(AppError::Validation(_))));

        let mut req = alice();
        req.password = "password".into();
        assert!(matches!(register(&repo, req).await, Err(AppError::Validation(_))));

        assert!(repo.all().await.is_empty());
    }

    #[tokio::test]
    async fn sequential_duplicates_are_rejected() {
        let repo = InMemoryUserRepository::new();
        register(&repo, alice()).await.expect("first");

        let mut same_name = alice();
        same_name.email = "other@x.com".into();
        assert!(matches!(
            register(&repo, same_name).await,
            Err(AppError::DuplicateUsername)
        ));

        let mut same_email = alice();
        same_email.username = "alice2".into();
        same_email.email = "A@x.com".into();
        assert!(matches!(
            register(&repo, same_email).await,
            Err(AppError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn concurrent_duplicates_yield_exactly_one_success() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let (a, b) = tokio::join!(register(repo.as_ref(), alice()), register(repo.as_ref(), alice()));

        let outcomes = [a, b];
        let successes = outcomes.iter().filter(|r| r.is_ok()).count();
        let duplicates = outcomes
            .iter()
            .filter(|r| matches!(r, Err(AppError::DuplicateUsername)))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(duplicates, 1);
        assert_eq!(repo.all().await.len(), 1);
    }

    #[tokio::test]
    async fn stored_fields_never_equal_plaintext_password() {
        let repo = InMemoryUserRepository::new();
        register(&repo, alice()).await.expect("register");
        for user in repo.all().await {
            for field in [&user.username, &user.email, &user.password_hash] {
                assert_ne!(field, "Passw0rd!");
            }
            let json = serde_json::to_string(&user).expect("serialize");
            assert!(!json.contains("Passw0rd!"));
            assert!(!json.contains("password_hash"));
        }
    }

    #[tokio::test]
    async fn login_issues_token_for_user() {
        let repo = InMemoryUserRepository::new();
        let keys = keys();
        let created = register(&repo, alice()).await.expect("register");

        let (token, user) = login(&repo, &keys, login_req("A@x.com", "Passw0rd!"))
            .await
            .expect("login");
        assert_eq!(user.id, created.id);
        assert_eq!(keys.subject_of(&token), Some(created.id));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let repo = InMemoryUserRepository::new();
        let keys = keys();
        register(&repo, alice()).await.expect("register");

        let unknown = login(&repo, &keys, login_req("nobody@x.com", "Passw0rd!"))
            .await
            .unwrap_err();
        let wrong = login(&repo, &keys, login_req("a@x.com", "Wr0ngpass"))
            .await
            .unwrap_err();
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.error_code(), wrong.error_code());
    }

    #[tokio::test]
    async fn unknown_email_costs_a_password_verification() {
        let repo = InMemoryUserRepository::new();
        let keys = keys();
        register(&repo, alice()).await.expect("register");

        let started = std::time::Instant::now();
        let wrong = login(&repo, &keys, login_req("a@x.com", "Wr0ngpass")).await;
        let wrong_elapsed = started.elapsed();

        let started = std::time::Instant::now();
        let unknown = login(&repo, &keys, login_req("nobody@x.com", "Passw0rd!")).await;
        let unknown_elapsed = started.elapsed();

        assert!(matches!(wrong, Err(AppError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AppError::InvalidCredentials)));
        assert!(
            unknown_elapsed * 4 >= wrong_elapsed,
            "unknown email answered in {unknown_elapsed:?}, wrong password in {wrong_elapsed:?}"
        );
    }

    #[tokio::test]
    async fn login_rejects_inactive_user() {
        let repo = InMemoryUserRepository::new();
        let keys = keys();
        let user = register(&repo, alice()).await.expect("register");
        repo.set_active(user.id, false).await.expect("deactivate");

        let err = login(&repo, &keys, login_req("a@x.com", "Passw0rd!"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }
}
