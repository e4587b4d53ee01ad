//! Authentication-facing tools: sign-in and the authenticated profile

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::auth::{SignInGateway, TokenVerifier};
use crate::error::{CartgateError, Result};

use super::{required_str, ToolExecutor};

/// Profile returned for an authenticated caller
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    /// The verified token subject
    pub user_id: String,
    /// Display name derived from the subject
    pub username: String,
    /// Email claim or derived placeholder
    pub email: String,
    /// Always true for a caller who just verified
    pub is_active: bool,
}

/// `sign_in` -- exchange email/password for a session token
pub struct SignInTool {
    gateway: Arc<SignInGateway>,
}

impl SignInTool {
    pub fn new(gateway: Arc<SignInGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ToolExecutor for SignInTool {
    fn tool_definition(&self) -> serde_json::Value {
        serde_json::json!({
            "name": "sign_in",
            "description": "Signs in and returns an access token.",
            "parameters": {
                "type": "object",
                "properties": {
                    "email": {"type": "string", "description": "Account email"},
                    "password": {"type": "string", "description": "Account password"}
                },
                "required": ["email", "password"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let email = required_str(&args, "email")?;
        let password = required_str(&args, "password")?;

        let token = self.gateway.sign_in(&email, &password).await?;
        Ok(serde_json::json!({
            "access_token": token.access_token,
            "token_type": "bearer",
        }))
    }
}

/// `get_user_profile` -- verify a bearer token and return the caller's profile
pub struct GetUserProfileTool {
    verifier: Arc<TokenVerifier>,
}

impl GetUserProfileTool {
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl ToolExecutor for GetUserProfileTool {
    fn tool_definition(&self) -> serde_json::Value {
        serde_json::json!({
            "name": "get_user_profile",
            "description": "Returns the authenticated user's profile from a bearer token.",
            "parameters": {
                "type": "object",
                "properties": {
                    "authorization": {
                        "type": "string",
                        "description": "Authorization header value: 'Bearer <token>'"
                    }
                },
                "required": ["authorization"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let authorization = required_str(&args, "authorization")?;
        let token = strip_bearer(&authorization)?;

        let identity = self.verifier.verify(token).await?;

        let prefix: String = identity.subject.chars().take(6).collect();
        let profile = UserProfile {
            username: format!("user_{prefix}"),
            user_id: identity.subject,
            email: identity.email,
            is_active: true,
        };
        Ok(serde_json::to_value(profile).map_err(CartgateError::Serialization)?)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
fn strip_bearer(authorization: &str) -> Result<&str> {
    authorization
        .strip_prefix("Bearer ")
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| {
            CartgateError::InvalidToken("authorization value is not a bearer token".to_string())
                .into()
        })
}
