//! Tool surface for cartgate
//!
//! Each remotely callable tool implements [`ToolExecutor`] and is registered
//! by name in a [`ToolRegistry`]. The registry only routes a named call with
//! JSON arguments to its handler and hands back the handler's JSON result;
//! transport and framing live elsewhere.
//!
//! Handlers hold explicitly constructed `Arc` clients injected at startup.
//! Nothing in this module reaches for ambient or global state.

pub mod auth_tools;
pub mod cart_tools;
pub mod misc;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::{SignInGateway, TokenVerifier};
use crate::error::{CartgateError, Result};
use crate::store::SessionStoreClient;

/// Tool executor trait for implementing tool logic
///
/// Each tool exposes a JSON definition (name, description, parameter schema)
/// and an async execute taking JSON arguments and returning a JSON result.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Returns the tool definition as a JSON value
    ///
    /// The definition carries `name`, `description` and a JSON schema under
    /// `parameters`.
    fn tool_definition(&self) -> serde_json::Value;

    /// Executes the tool with the given arguments
    ///
    /// # Errors
    ///
    /// Returns an error when the arguments are malformed or the underlying
    /// operation fails; the dispatch layer turns it into a rejected call.
    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value>;
}

/// Tool registry for routing named calls to handlers
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool executor under a name
    pub fn register(&mut self, name: impl Into<String>, executor: Arc<dyn ToolExecutor>) {
        self.tools.insert(name.into(), executor);
    }

    /// Get a tool executor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.get(name).cloned()
    }

    /// Execute the named tool with the given arguments
    ///
    /// # Errors
    ///
    /// Returns [`CartgateError::Tool`] for an unknown tool name, or whatever
    /// the handler itself fails with.
    pub async fn execute(&self, name: &str, args: serde_json::Value) -> Result<serde_json::Value> {
        let executor = self
            .get(name)
            .ok_or_else(|| CartgateError::Tool(format!("unknown tool: {name}")))?;
        executor.execute(args).await
    }

    /// Get all tool definitions as JSON values
    pub fn all_definitions(&self) -> Vec<serde_json::Value> {
        self.tools
            .values()
            .map(|executor| executor.tool_definition())
            .collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the full cartgate registry over the given clients
///
/// This is the one place the tool surface is assembled; everything else
/// receives the registry ready-made.
pub fn build_registry(
    gateway: Arc<SignInGateway>,
    verifier: Arc<TokenVerifier>,
    store: Arc<SessionStoreClient>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register("sign_in", Arc::new(auth_tools::SignInTool::new(gateway)));
    registry.register(
        "get_user_profile",
        Arc::new(auth_tools::GetUserProfileTool::new(verifier)),
    );
    registry.register(
        "create_cart",
        Arc::new(cart_tools::CreateCartTool::new(store.clone())),
    );
    registry.register(
        "add_to_cart",
        Arc::new(cart_tools::AddToCartTool::new(store.clone())),
    );
    registry.register("view_cart", Arc::new(cart_tools::ViewCartTool::new(store)));
    registry.register("search_news", Arc::new(misc::SearchNewsTool));
    registry.register("divide", Arc::new(misc::DivideTool));
    registry
}

/// Pull a required string argument out of a tool's JSON args
pub(crate) fn required_str(args: &serde_json::Value, name: &str) -> Result<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| CartgateError::Tool(format!("missing required argument: {name}")).into())
}
