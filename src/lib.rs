//! cartgate - authenticated tool server library
//!
//! This library provides the core functionality for cartgate: bearer-token
//! verification against a third-party identity provider's rotating key set,
//! password-grant sign-in, and per-session cart state held in a remote
//! keyed-document store behind an optimistic read-modify-write protocol.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: key set cache, token verification, and sign-in gateway
//! - `store`: session store client and cart state
//! - `tools`: tool executors and the name-keyed registry
//! - `server`: line-delimited JSON stdio serve loop
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cartgate::auth::{KeySetCache, TokenVerifier};
//! use cartgate::Config;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load("config/config.yaml")?;
//! config.validate()?;
//!
//! let http = Arc::new(reqwest::Client::new());
//! let keys = Arc::new(KeySetCache::new(http, config.auth.jwks_url()));
//! let verifier = TokenVerifier::new(
//!     keys,
//!     config.auth.issuer.clone(),
//!     config.auth.audience.clone(),
//! );
//!
//! let identity = verifier.verify("eyJ...").await?;
//! println!("authenticated: {}", identity.subject);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod tools;

// Re-export commonly used types
pub use auth::{AuthToken, AuthenticatedIdentity, KeySetCache, SignInGateway, TokenVerifier};
pub use config::Config;
pub use error::{CartgateError, Result};
pub use store::{CartLine, CartState, SessionStoreClient};
