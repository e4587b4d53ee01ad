//! Unauthenticated utility tools: the search stub and the division helper

use async_trait::async_trait;

use crate::error::{CartgateError, Result};

use super::{required_str, ToolExecutor};

/// `search_news` -- placeholder search returning stub headlines
pub struct SearchNewsTool;

#[async_trait]
impl ToolExecutor for SearchNewsTool {
    fn tool_definition(&self) -> serde_json::Value {
        serde_json::json!({
            "name": "search_news",
            "description": "Searches news about a topic.",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Topic to search for"},
                    "limit": {"type": "integer", "description": "Maximum results, default 10"}
                },
                "required": ["query"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let query = required_str(&args, "query")?;
        let limit = args.get("limit").and_then(|v| v.as_u64()).unwrap_or(10);

        tracing::debug!(query = %query, limit, "serving stub news results");
        let results: Vec<String> = (1..=limit)
            .map(|i| format!("Story {i} about {query}"))
            .collect();
        Ok(serde_json::json!(results))
    }
}

/// `divide` -- divides two numbers, failing on a zero divisor
pub struct DivideTool;

#[async_trait]
impl ToolExecutor for DivideTool {
    fn tool_definition(&self) -> serde_json::Value {
        serde_json::json!({
            "name": "divide",
            "description": "Divides two numbers. Fails when the divisor is zero.",
            "parameters": {
                "type": "object",
                "properties": {
                    "a": {"type": "number", "description": "Dividend"},
                    "b": {"type": "number", "description": "Divisor"}
                },
                "required": ["a", "b"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let a = args
            .get("a")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| CartgateError::Tool("missing required argument: a".to_string()))?;
        let b = args
            .get("b")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| CartgateError::Tool("missing required argument: b".to_string()))?;

        if b == 0.0 {
            return Err(CartgateError::Tool("cannot divide by zero".to_string()).into());
        }
        Ok(serde_json::json!(a / b))
    }
}
