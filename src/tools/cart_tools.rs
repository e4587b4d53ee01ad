//! Cart-facing tools over the session store
//!
//! Cart tools are addressable by session id alone and are independent of
//! authentication; a session is not tied to a signed-in subject.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{CartgateError, Result};
use crate::store::SessionStoreClient;

use super::{required_str, ToolExecutor};

/// `create_cart` -- create a new session with an empty cart
pub struct CreateCartTool {
    store: Arc<SessionStoreClient>,
}

impl CreateCartTool {
    pub fn new(store: Arc<SessionStoreClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolExecutor for CreateCartTool {
    fn tool_definition(&self) -> serde_json::Value {
        serde_json::json!({
            "name": "create_cart",
            "description": "Creates a new shopping session and returns its id.",
            "parameters": {"type": "object", "properties": {}}
        })
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<serde_json::Value> {
        let session_id = self.store.create_session().await?;
        Ok(serde_json::json!({"session_id": session_id}))
    }
}

/// `add_to_cart` -- merge an item quantity into a session's cart
pub struct AddToCartTool {
    store: Arc<SessionStoreClient>,
}

impl AddToCartTool {
    pub fn new(store: Arc<SessionStoreClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolExecutor for AddToCartTool {
    fn tool_definition(&self) -> serde_json::Value {
        serde_json::json!({
            "name": "add_to_cart",
            "description": "Adds a quantity of an item to a session's cart.",
            "parameters": {
                "type": "object",
                "properties": {
                    "session_id": {"type": "string", "description": "Session id from create_cart"},
                    "item": {"type": "string", "description": "Item name"},
                    "quantity": {"type": "integer", "description": "How many to add, positive"}
                },
                "required": ["session_id", "item", "quantity"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let session_id = required_str(&args, "session_id")?;
        let item = required_str(&args, "item")?;
        let quantity = args
            .get("quantity")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| {
                CartgateError::Tool("missing required argument: quantity".to_string())
            })?;

        let cart = self
            .store
            .update_cart(&session_id, |cart| cart.merge_item(&item, quantity))
            .await?;
        Ok(serde_json::to_value(cart).map_err(CartgateError::Serialization)?)
    }
}

/// `view_cart` -- fetch a session's current cart
pub struct ViewCartTool {
    store: Arc<SessionStoreClient>,
}

impl ViewCartTool {
    pub fn new(store: Arc<SessionStoreClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolExecutor for ViewCartTool {
    fn tool_definition(&self) -> serde_json::Value {
        serde_json::json!({
            "name": "view_cart",
            "description": "Returns the current contents of a session's cart.",
            "parameters": {
                "type": "object",
                "properties": {
                    "session_id": {"type": "string", "description": "Session id from create_cart"}
                },
                "required": ["session_id"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let session_id = required_str(&args, "session_id")?;
        let cart = self.store.get_cart(&session_id).await?;
        Ok(serde_json::to_value(cart).map_err(CartgateError::Serialization)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_to_cart_definition_requires_all_arguments() {
        let store = Arc::new(SessionStoreClient::new(
            Arc::new(reqwest::Client::new()),
            &crate::config::StoreConfig {
                url: "http://store.invalid/rest/v1".to_string(),
                api_key: String::new(),
                table: "sessions".to_string(),
            },
        ));
        let def = AddToCartTool::new(store).tool_definition();
        let required = def["parameters"]["required"]
            .as_array()
            .expect("required list");
        assert_eq!(required.len(), 3);
    }

    #[tokio::test]
    async fn test_add_to_cart_missing_quantity_fails_before_any_store_call() {
        let store = Arc::new(SessionStoreClient::new(
            Arc::new(reqwest::Client::new()),
            &crate::config::StoreConfig {
                url: "http://store.invalid/rest/v1".to_string(),
                api_key: String::new(),
                table: "sessions".to_string(),
            },
        ));
        let tool = AddToCartTool::new(store);
        let err = tool
            .execute(serde_json::json!({"session_id": "s1", "item": "apple"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CartgateError>(),
            Some(CartgateError::Tool(_))
        ));
    }
}
