//! Error types for cartgate
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.
//!
//! Token verification failures (`InvalidToken`, `SignatureInvalid`,
//! `ClaimsInvalid`, `KeyNotFound`) deliberately render generic messages:
//! upstream detail must not reach callers where it could aid token forgery.
//! The detail strings are kept on the variants for logging only. Sign-in and
//! store failures are operational problems, so those include the upstream
//! error text.

use thiserror::Error;

/// Main error type for cartgate operations
///
/// This enum encompasses all possible errors that can occur during
/// sign-in, token verification, session store access, and cart mutation,
/// plus ambient configuration and transport failures.
#[derive(Error, Debug)]
pub enum CartgateError {
    /// Sign-in was rejected by the identity provider or the grant call failed
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The presented token is structurally malformed or its header is
    /// unparseable. The inner detail is for logging, not display.
    #[error("invalid or malformed token")]
    InvalidToken(String),

    /// The token's signature did not verify against the resolved signing key,
    /// or the header declared an algorithm the key does not use
    #[error("token signature verification failed")]
    SignatureInvalid,

    /// The token's claims failed validation (issuer, audience, expiry, or
    /// missing subject). The inner detail is for logging, not display.
    #[error("token invalid or expired")]
    ClaimsInvalid(String),

    /// No key in the identity provider's current key set matches the token's
    /// key id
    #[error("no signing key found for key id '{0}'")]
    KeyNotFound(String),

    /// No session document exists for the given session id
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The document store rejected a write or returned an unusable response
    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),

    /// A cart mutation was attempted with a non-positive quantity, or one
    /// the target line cannot hold
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Tool dispatch errors (unknown tool, malformed arguments)
    #[error("tool error: {0}")]
    Tool(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for cartgate operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
