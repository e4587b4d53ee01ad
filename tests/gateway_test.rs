//! Sign-in gateway integration tests using wiremock
//!
//! Verifies the password-grant exchange: exactly one network call per
//! attempt, upstream error text preserved in `AuthenticationFailed`, and the
//! grant response converted into an `AuthToken` with a computed expiry.

mod common;

use std::sync::Arc;

use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cartgate::auth::SignInGateway;
use cartgate::config::AuthConfig;
use cartgate::error::CartgateError;

use common::{AUDIENCE, ISSUER};

fn gateway_for(server: &MockServer) -> SignInGateway {
    let config = AuthConfig {
        url: server.uri(),
        api_key: "anon-key".to_string(),
        issuer: ISSUER.to_string(),
        audience: AUDIENCE.to_string(),
        min_key_refresh_seconds: 30,
    };
    SignInGateway::new(Arc::new(reqwest::Client::new()), &config)
}

#[tokio::test]
async fn test_sign_in_returns_access_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .and(body_partial_json(serde_json::json!({
            "email": "shopper@example.org",
            "password": "hunter2",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "eyJ.fake.token",
            "token_type": "bearer",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = gateway_for(&server)
        .sign_in("shopper@example.org", "hunter2")
        .await
        .expect("sign in");

    assert_eq!(token.access_token, "eyJ.fake.token");
    assert_eq!(token.token_type, "bearer");
    assert!(token.expires_at.is_some());
    assert!(!token.is_expired());
}

#[tokio::test]
async fn test_sign_in_wrong_credentials_wraps_upstream_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("invalid login credentials"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway_for(&server)
        .sign_in("shopper@example.org", "wrong")
        .await
        .unwrap_err();

    let kind = err
        .downcast_ref::<CartgateError>()
        .expect("cartgate error kind");
    assert!(matches!(kind, CartgateError::AuthenticationFailed(_)));
    // Sign-in failures are operational; the upstream message is preserved.
    assert!(kind.to_string().contains("invalid login credentials"));
}

#[tokio::test]
async fn test_sign_in_upstream_error_is_not_retried() {
    let server = MockServer::start().await;

    // A 503 must surface as AuthenticationFailed after exactly one request;
    // retrying a password grant risks provider-side lockout.
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway_for(&server)
        .sign_in("shopper@example.org", "hunter2")
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CartgateError>(),
        Some(CartgateError::AuthenticationFailed(_))
    ));
}

#[tokio::test]
async fn test_sign_in_unreadable_grant_response_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway_for(&server)
        .sign_in("shopper@example.org", "hunter2")
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CartgateError>(),
        Some(CartgateError::AuthenticationFailed(_))
    ));
}
