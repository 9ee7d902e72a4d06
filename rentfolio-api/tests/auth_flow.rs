/// Integration tests for the authentication lifecycle
///
/// These drive the full router against a real PostgreSQL instance and are
/// ignored by default; see `common/mod.rs` for how to run them.

mod common;

use axum::http::StatusCode;
use common::{unique_email, TestContext, GOOD_PASSWORD};
use rentfolio_api::services::identity;
use rentfolio_shared::models::user::UserRole;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn register_verify_login_scenario() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;
    let email = unique_email("owner");

    // Register: returns ids and requires verification
    let (status, body) = ctx
        .post(
            "/v1/auth/register",
            json!({ "email": email, "password": GOOD_PASSWORD, "account_name": "My LLC" }),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requires_email_verification"], true);
    let user_id: Uuid = body["user_id"].as_str().unwrap().parse()?;

    // Login before verification is refused with the dedicated message
    let (status, body) = ctx
        .post(
            "/v1/auth/login",
            json!({ "email": email, "password": GOOD_PASSWORD }),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], identity::MSG_EMAIL_NOT_VERIFIED);

    // Verify (a reissued token invalidates the registration one, which is fine)
    let token = identity::generate_email_verification_token(&ctx.db, user_id).await.unwrap();
    let (status, _) = ctx
        .post("/v1/auth/verify-email", json!({ "token": token }), None)
        .await?;
    assert_eq!(status, StatusCode::OK);

    // Second use of the same token: already used
    let (status, body) = ctx
        .post("/v1/auth/verify-email", json!({ "token": token }), None)
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], identity::MSG_VERIFICATION_ALREADY_USED);

    // Login now succeeds with role and both tokens
    let (status, body) = ctx
        .post(
            "/v1/auth/login",
            json!({ "email": email, "password": GOOD_PASSWORD }),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "owner");
    assert!(body["access_token"].as_str().unwrap().len() > 0);
    assert!(body["refresh_token"].as_str().unwrap().len() > 0);
    assert_eq!(body["expires_in"], 3600);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn login_failures_are_indistinguishable() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;
    let email = unique_email("verified");
    ctx.create_verified_user(&email, GOOD_PASSWORD, UserRole::Owner)
        .await?;

    let (unknown_status, unknown_body) = ctx
        .post(
            "/v1/auth/login",
            json!({ "email": unique_email("nobody"), "password": "whatever" }),
            None,
        )
        .await?;

    let (wrong_status, wrong_body) = ctx
        .post(
            "/v1/auth/login",
            json!({ "email": email, "password": "WrongPass1!" }),
            None,
        )
        .await?;

    // Same status, same error code, byte-identical message
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_body, wrong_body);
    assert_eq!(unknown_body["message"], identity::MSG_INVALID_CREDENTIALS);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn registration_rolls_back_account_on_weak_password() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;
    let email = unique_email("weak");

    let (status, body) = ctx
        .post(
            "/v1/auth/register",
            json!({ "email": email, "password": "short", "account_name": "Doomed LLC" }),
            None,
        )
        .await?;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    // Every violation reported, not just the first
    assert!(body["details"].as_array().unwrap().len() > 1);

    // The compensating delete removed the account and no user exists
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE name = 'Doomed LLC')")
            .fetch_one(&ctx.db)
            .await?;
    assert!(!exists);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn forgot_password_has_constant_response_shape() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;
    let email = unique_email("known");
    ctx.create_verified_user(&email, GOOD_PASSWORD, UserRole::Owner)
        .await?;

    let (known_status, known_body) = ctx
        .post("/v1/auth/forgot-password", json!({ "email": email }), None)
        .await?;
    let (unknown_status, unknown_body) = ctx
        .post(
            "/v1/auth/forgot-password",
            json!({ "email": unique_email("ghost") }),
            None,
        )
        .await?;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known_body, unknown_body);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn reset_password_revokes_all_refresh_tokens() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;
    let email = unique_email("resetter");
    let user = ctx
        .create_verified_user(&email, GOOD_PASSWORD, UserRole::Owner)
        .await?;

    // Two device sessions
    let mut refresh_tokens = Vec::new();
    for device in ["laptop", "phone"] {
        let (status, body) = ctx
            .post(
                "/v1/auth/login",
                json!({ "email": email, "password": GOOD_PASSWORD, "device_name": device }),
                None,
            )
            .await?;
        assert_eq!(status, StatusCode::OK);
        refresh_tokens.push(body["refresh_token"].as_str().unwrap().to_string());
    }

    // Reset via a token obtained through the service seam
    let reset_token = identity::generate_password_reset_token(&ctx.db, user.id).await.unwrap();
    let (status, _) = ctx
        .post(
            "/v1/auth/reset-password",
            json!({ "token": reset_token, "new_password": "N3w!Passw0rd" }),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    // No live sessions remain in the ledger
    let active =
        rentfolio_shared::models::refresh_token::RefreshToken::list_active_for_user(&ctx.db, user.id)
            .await?;
    assert!(active.is_empty());

    // Every previously issued refresh token is now invalid
    for token in &refresh_tokens {
        let (status, _) = ctx
            .post("/v1/auth/refresh", json!({ "refresh_token": token }), None)
            .await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // Old password refused, new password accepted
    let (status, _) = ctx
        .post(
            "/v1/auth/login",
            json!({ "email": email, "password": GOOD_PASSWORD }),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .post(
            "/v1/auth/login",
            json!({ "email": email, "password": "N3w!Passw0rd" }),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn logout_is_idempotent_and_scoped_to_one_token() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;
    let email = unique_email("logout");
    ctx.create_verified_user(&email, GOOD_PASSWORD, UserRole::Owner)
        .await?;

    // Logout with no session at all succeeds
    let (status, _) = ctx.post("/v1/auth/logout", json!({}), None).await?;
    assert_eq!(status, StatusCode::OK);

    // Two sessions; logging out one leaves the other alive
    let mut tokens = Vec::new();
    for _ in 0..2 {
        let (_, body) = ctx
            .post(
                "/v1/auth/login",
                json!({ "email": email, "password": GOOD_PASSWORD }),
                None,
            )
            .await?;
        tokens.push(body["refresh_token"].as_str().unwrap().to_string());
    }

    let (status, _) = ctx
        .post("/v1/auth/logout", json!({ "refresh_token": tokens[0] }), None)
        .await?;
    assert_eq!(status, StatusCode::OK);

    // Revoking again is a no-op, not an error
    let (status, _) = ctx
        .post("/v1/auth/logout", json!({ "refresh_token": tokens[0] }), None)
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .post("/v1/auth/refresh", json!({ "refresh_token": tokens[0] }), None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .post("/v1/auth/refresh", json!({ "refresh_token": tokens[1] }), None)
        .await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn refresh_returns_no_replacement_when_rotation_disabled() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;
    let email = unique_email("refresher");
    ctx.create_verified_user(&email, GOOD_PASSWORD, UserRole::Contributor)
        .await?;

    let (_, body) = ctx
        .post(
            "/v1/auth/login",
            json!({ "email": email, "password": GOOD_PASSWORD }),
            None,
        )
        .await?;
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .post(
            "/v1/auth/refresh",
            json!({ "refresh_token": refresh_token }),
            None,
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].as_str().unwrap().len() > 0);
    assert!(body.get("refresh_token").is_none());

    // The same token keeps working (no silent rotation)
    let (status, _) = ctx
        .post(
            "/v1/auth/refresh",
            json!({ "refresh_token": refresh_token }),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}
