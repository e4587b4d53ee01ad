//! Authentication against a third-party identity provider
//!
//! cartgate never issues or stores credentials itself. Sign-in is delegated
//! to the provider's password-grant endpoint, and bearer tokens presented on
//! later calls are verified locally against the provider's published signing
//! keys.
//!
//! # Module Layout
//!
//! - [`keyset`]   -- JWKS fetch and kid-indexed signing key cache
//! - [`verifier`] -- bearer token verification and identity extraction
//! - [`gateway`]  -- password-grant sign-in

pub mod gateway;
pub mod keyset;
pub mod verifier;

pub use gateway::{AuthToken, SignInGateway};
pub use keyset::KeySetCache;
pub use verifier::{AuthenticatedIdentity, TokenVerifier};
