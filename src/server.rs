//! Line-delimited JSON serve loop over stdio
//!
//! Requests arrive one per line as `{"tool": <name>, "args": {...}}` and are
//! answered in order with `{"ok": true, "result": ...}` or
//! `{"ok": false, "error": <message>}`. The error message is whatever the
//! failure displays as, so the taxonomy's redaction of verification detail
//! applies here unchanged.

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::Result;
use crate::tools::ToolRegistry;

/// One inbound tool call
#[derive(Debug, Deserialize)]
struct ToolRequest {
    tool: String,
    #[serde(default)]
    args: serde_json::Value,
}

/// Serve tool calls from stdin until EOF
///
/// Each request is handled as its own unit of work; the only suspension
/// points are the provider and store network calls made by the handlers.
///
/// # Errors
///
/// Returns an error only when stdio itself fails; per-request failures are
/// reported on the response line and the loop continues.
pub async fn serve(registry: ToolRegistry) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut lines = stdin.lines();

    tracing::info!(tool_count = registry.len(), "serving tools on stdio");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = handle_line(&registry, &line).await;
        let mut out = serde_json::to_vec(&reply)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

/// Dispatch one request line and shape the response value
async fn handle_line(registry: &ToolRegistry, line: &str) -> serde_json::Value {
    let request: ToolRequest = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(e) => {
            return serde_json::json!({"ok": false, "error": format!("malformed request: {e}")});
        }
    };

    tracing::debug!(tool = %request.tool, "dispatching tool call");
    match registry.execute(&request.tool, request.args).await {
        Ok(result) => serde_json::json!({"ok": true, "result": result}),
        Err(e) => {
            tracing::debug!(tool = %request.tool, error = %e, "tool call failed");
            serde_json::json!({"ok": false, "error": e.to_string()})
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolExecutor;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct PingTool;

    #[async_trait]
    impl ToolExecutor for PingTool {
        fn tool_definition(&self) -> serde_json::Value {
            serde_json::json!({"name": "ping", "description": "", "parameters": {}})
        }

        async fn execute(&self, _args: serde_json::Value) -> Result<serde_json::Value> {
            Ok(serde_json::json!("pong"))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register("ping", Arc::new(PingTool));
        registry
    }

    #[tokio::test]
    async fn test_handle_line_success_shape() {
        let reply = handle_line(&registry(), r#"{"tool": "ping"}"#).await;
        assert_eq!(reply, serde_json::json!({"ok": true, "result": "pong"}));
    }

    #[tokio::test]
    async fn test_handle_line_unknown_tool_reports_error() {
        let reply = handle_line(&registry(), r#"{"tool": "nope", "args": {}}"#).await;
        assert_eq!(reply["ok"], false);
        assert!(reply["error"].as_str().unwrap().contains("unknown tool"));
    }

    #[tokio::test]
    async fn test_handle_line_malformed_json_reports_error() {
        let reply = handle_line(&registry(), "{not json").await;
        assert_eq!(reply["ok"], false);
        assert!(reply["error"].as_str().unwrap().contains("malformed"));
    }
}
