//! Configuration management for cartgate
//!
//! This module handles loading, parsing, and validating configuration from
//! YAML files and environment variables. Secrets (the identity provider and
//! store api keys) can be supplied via `CARTGATE_AUTH_API_KEY` and
//! `CARTGATE_STORE_API_KEY` instead of the config file.

use crate::error::{CartgateError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for cartgate
///
/// This structure holds everything needed to stand the server up: identity
/// provider settings for sign-in and token verification, document store
/// settings for session state, and HTTP client behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identity provider configuration
    pub auth: AuthConfig,
    /// Session document store configuration
    pub store: StoreConfig,
    /// Shared HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,
}

/// Identity provider configuration
///
/// The provider is expected to expose a password-grant token endpoint at
/// `{url}/token?grant_type=password` and its public signing keys at
/// `{url}/.well-known/jwks.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the identity provider's auth API (no trailing slash)
    pub url: String,

    /// Publishable api key sent with every provider request
    #[serde(default)]
    pub api_key: String,

    /// Exact `iss` value expected in verified tokens
    pub issuer: String,

    /// Exact `aud` value expected in verified tokens
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Minimum seconds between forced key-set refetches; misses inside this
    /// window fail without a network call
    #[serde(default = "default_min_refresh_seconds")]
    pub min_key_refresh_seconds: u64,
}

fn default_audience() -> String {
    "authenticated".to_string()
}

fn default_min_refresh_seconds() -> u64 {
    30
}

impl AuthConfig {
    /// URL of the provider's published JWKS document
    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.url.trim_end_matches('/'))
    }

    /// URL of the provider's password-grant token endpoint
    pub fn token_url(&self) -> String {
        format!(
            "{}/token?grant_type=password",
            self.url.trim_end_matches('/')
        )
    }
}

/// Session document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the store's REST API (no trailing slash)
    pub url: String,

    /// Api key sent with every store request
    #[serde(default)]
    pub api_key: String,

    /// Collection holding session documents
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    "sessions".to_string()
}

impl StoreConfig {
    /// URL of the session collection endpoint
    pub fn table_url(&self) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), self.table)
    }
}

/// Shared HTTP client configuration
///
/// One `reqwest::Client` built from these settings is shared by every
/// component, so the timeout bounds both key-set fetches and store calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds for all outbound calls
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, then apply environment overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Errors
    ///
    /// Returns [`CartgateError::Io`] if the file cannot be read or
    /// [`CartgateError::Yaml`] if it does not parse.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(CartgateError::Io)?;
        let mut config: Config = serde_yaml::from_str(&contents).map_err(CartgateError::Yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Overlay secrets from the environment onto the loaded config
    ///
    /// Environment values win over file values so that api keys can be kept
    /// out of checked-in configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("CARTGATE_AUTH_API_KEY") {
            self.auth.api_key = key;
        }
        if let Ok(key) = std::env::var("CARTGATE_STORE_API_KEY") {
            self.store.api_key = key;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`CartgateError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.auth.url.is_empty() {
            return Err(CartgateError::Config("auth.url must be set".to_string()).into());
        }
        if self.auth.issuer.is_empty() {
            return Err(CartgateError::Config("auth.issuer must be set".to_string()).into());
        }
        if self.auth.audience.is_empty() {
            return Err(CartgateError::Config("auth.audience must be set".to_string()).into());
        }
        if self.store.url.is_empty() {
            return Err(CartgateError::Config("store.url must be set".to_string()).into());
        }
        if self.store.table.is_empty() {
            return Err(CartgateError::Config("store.table must be set".to_string()).into());
        }
        if self.http.timeout_seconds == 0 {
            return Err(
                CartgateError::Config("http.timeout_seconds must be positive".to_string()).into(),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_yaml() -> &'static str {
        r#"
auth:
  url: https://project.example.supabase.co/auth/v1
  api_key: anon-key
  issuer: https://project.example.supabase.co/auth/v1
store:
  url: https://project.example.supabase.co/rest/v1
  api_key: anon-key
"#
    }

    fn parse_sample() -> Config {
        serde_yaml::from_str(sample_yaml()).expect("sample config parses")
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(sample_yaml().as_bytes()).expect("write");

        let config = Config::load(file.path()).expect("load");
        assert_eq!(
            config.auth.url,
            "https://project.example.supabase.co/auth/v1"
        );
        assert_eq!(config.store.table, "sessions");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Config::load("/nonexistent/cartgate.yaml");
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse_sample();
        assert_eq!(config.auth.audience, "authenticated");
        assert_eq!(config.auth.min_key_refresh_seconds, 30);
        assert_eq!(config.http.timeout_seconds, 10);
    }

    #[test]
    fn test_jwks_url_derivation() {
        let config = parse_sample();
        assert_eq!(
            config.auth.jwks_url(),
            "https://project.example.supabase.co/auth/v1/.well-known/jwks.json"
        );
    }

    #[test]
    fn test_token_url_derivation() {
        let config = parse_sample();
        assert_eq!(
            config.auth.token_url(),
            "https://project.example.supabase.co/auth/v1/token?grant_type=password"
        );
    }

    #[test]
    fn test_table_url_handles_trailing_slash() {
        let mut config = parse_sample();
        config.store.url = "https://store.example.com/rest/v1/".to_string();
        assert_eq!(
            config.store.table_url(),
            "https://store.example.com/rest/v1/sessions"
        );
    }

    #[test]
    fn test_validate_accepts_sample() {
        let config = parse_sample();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_auth_url() {
        let mut config = parse_sample();
        config.auth.url = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("auth.url"));
    }

    #[test]
    fn test_validate_rejects_empty_issuer() {
        let mut config = parse_sample();
        config.auth.issuer = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = parse_sample();
        config.http.timeout_seconds = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }
}
