//! Session document store client
//!
//! This module talks to the remote keyed-document store holding per-session
//! cart state. The store exposes a PostgREST-style REST surface over a single
//! collection: insert returns the generated row (including its id), select is
//! by id equality, and update is a `PATCH` filtered by id.
//!
//! Updates use optimistic concurrency: every document carries a `version`
//! stamp, and `update_cart` conditions its write on the stamp being unchanged
//! since the read. A lost race returns zero affected rows, in which case the
//! read-merge-write is retried a bounded number of times before giving up
//! with `StoreUnavailable`.

pub mod cart;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::error::{CartgateError, Result};

pub use cart::{CartLine, CartState};

/// Maximum read-merge-write attempts before a conflicted update fails
const MAX_UPDATE_ATTEMPTS: u32 = 3;

/// One session row as stored in the document store
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionDocument {
    /// Store-assigned session id
    id: String,
    /// The session's cart
    state: CartState,
    /// Optimistic concurrency stamp, incremented on every write
    version: i64,
}

/// Client for the session collection of the remote document store
///
/// Holds an explicitly injected shared HTTP client; nothing here is ambient
/// or process-global. All calls inherit the client's bounded request timeout.
pub struct SessionStoreClient {
    http: Arc<reqwest::Client>,
    table_url: String,
    api_key: String,
}

impl SessionStoreClient {
    /// Create a new store client
    ///
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client for all store requests.
    /// * `config` - Store endpoint and credentials.
    pub fn new(http: Arc<reqwest::Client>, config: &StoreConfig) -> Self {
        Self {
            http,
            table_url: config.table_url(),
            api_key: config.api_key.clone(),
        }
    }

    /// Create a new session with an empty cart, returning its store-assigned id
    ///
    /// # Errors
    ///
    /// Returns [`CartgateError::StoreUnavailable`] if the insert is rejected
    /// or does not return the generated row.
    pub async fn create_session(&self) -> Result<String> {
        let body = serde_json::json!({
            "state": CartState::empty(),
            "version": 0,
        });

        let resp = self
            .http
            .post(&self.table_url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(|e| CartgateError::StoreUnavailable(format!("insert request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(
                CartgateError::StoreUnavailable(format!("insert returned {status}: {text}")).into(),
            );
        }

        let rows: Vec<SessionDocument> = resp
            .json()
            .await
            .map_err(|e| CartgateError::StoreUnavailable(format!("unreadable insert reply: {e}")))?;

        let id = rows
            .into_iter()
            .next()
            .map(|doc| doc.id)
            .ok_or_else(|| {
                CartgateError::StoreUnavailable("insert returned no generated id".to_string())
            })?;

        tracing::debug!(session_id = %id, "created session");
        Ok(id)
    }

    /// Fetch the cart for a session
    ///
    /// # Errors
    ///
    /// Returns [`CartgateError::SessionNotFound`] when no document matches
    /// `session_id`.
    pub async fn get_cart(&self, session_id: &str) -> Result<CartState> {
        let doc = self.fetch_document(session_id).await?;
        Ok(doc.state)
    }

    /// Read the session's cart, apply `mutation`, and write the result back
    ///
    /// The write is conditioned on the document's version stamp being
    /// unchanged since the read. On conflict the whole read-merge-write is
    /// retried (the mutation is re-applied to the fresh state), bounded at
    /// [`MAX_UPDATE_ATTEMPTS`].
    ///
    /// # Errors
    ///
    /// Returns [`CartgateError::SessionNotFound`] when the session does not
    /// exist, any error produced by `mutation` itself, or
    /// [`CartgateError::StoreUnavailable`] when the write is rejected or the
    /// conflict retries are exhausted.
    pub async fn update_cart<F>(&self, session_id: &str, mutation: F) -> Result<CartState>
    where
        F: Fn(&CartState) -> Result<CartState>,
    {
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let doc = self.fetch_document(session_id).await?;
            let new_state = mutation(&doc.state)?;

            if let Some(written) = self.write_conditional(session_id, &doc, new_state).await? {
                return Ok(written);
            }

            tracing::debug!(
                session_id,
                attempt,
                version = doc.version,
                "conditional update lost a concurrent write, retrying"
            );
        }

        Err(CartgateError::StoreUnavailable(format!(
            "update conflicted {MAX_UPDATE_ATTEMPTS} times for session {session_id}"
        ))
        .into())
    }

    /// Select the session document by id
    async fn fetch_document(&self, session_id: &str) -> Result<SessionDocument> {
        let resp = self
            .http
            .get(&self.table_url)
            .query(&[("id", format!("eq.{session_id}")), ("limit", "1".to_string())])
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| CartgateError::StoreUnavailable(format!("select request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(
                CartgateError::StoreUnavailable(format!("select returned {status}: {text}")).into(),
            );
        }

        let rows: Vec<SessionDocument> = resp
            .json()
            .await
            .map_err(|e| CartgateError::StoreUnavailable(format!("unreadable select reply: {e}")))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| CartgateError::SessionNotFound(session_id.to_string()).into())
    }

    /// Write `new_state` back, conditioned on the version stamp read in `doc`
    ///
    /// Returns `Ok(None)` when the condition did not match any row (a
    /// concurrent writer advanced the version), signalling the caller to
    /// retry.
    async fn write_conditional(
        &self,
        session_id: &str,
        doc: &SessionDocument,
        new_state: CartState,
    ) -> Result<Option<CartState>> {
        let body = serde_json::json!({
            "state": new_state,
            "version": doc.version + 1,
        });

        let resp = self
            .http
            .patch(&self.table_url)
            .query(&[
                ("id", format!("eq.{session_id}")),
                ("version", format!("eq.{}", doc.version)),
            ])
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(|e| CartgateError::StoreUnavailable(format!("update request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(
                CartgateError::StoreUnavailable(format!("update returned {status}: {text}")).into(),
            );
        }

        let rows: Vec<SessionDocument> = resp
            .json()
            .await
            .map_err(|e| CartgateError::StoreUnavailable(format!("unreadable update reply: {e}")))?;

        Ok(rows.into_iter().next().map(|doc| doc.state))
    }
}
