//! Minimal MCP client: JSON-RPC 2.0 over HTTP POST.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// JSON-RPC message types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Sentiment label from a tool result: `analysis.sentiment` in structured
/// content or in JSON text content, else a sentiment word in plain text.
pub fn sentiment_from_result(result: &Value) -> Option<String> {
    if let Some(s) = result["structuredContent"]["analysis"]["sentiment"].as_str() {
        return Some(s.to_string());
    }
    if let Some(s) = result["analysis"]["sentiment"].as_str() {
        return Some(s.to_string());
    }
    let text = result["content"]
        .as_array()?
        .iter()
        .filter_map(|c| c["text"].as_str())
        .collect::<Vec<_>>()
        .join(" ");
    if let Ok(inner) = serde_json::from_str::<Value>(&text) {
        if let Some(s) = inner["analysis"]["sentiment"].as_str() {
            return Some(s.to_string());
        }
    }
    let lowered = text.to_lowercase();
    ["positive", "negative", "neutral"]
        .into_iter()
        .find(|w| lowered.contains(w))
        .map(str::to_string)
}

pub struct McpClient {
    server_url: Option<String>,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl McpClient {
    pub fn new(server_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            server_url,
            client,
            next_id: AtomicU64::new(1),
        }
    }

    async fn call(&self, method: &str, params: Value) -> anyhow::Result<Value> {
        let Some(url) = self.server_url.as_deref() else {
            anyhow::bail!("No tool server is configured.");
        };
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!(method, id = request.id, "MCP request");
        let resp = self.client.post(url).json(&request).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("Tool server returned {}", resp.status());
        }
        let body: JsonRpcResponse = resp.json().await?;
        if let Some(err) = body.error {
            anyhow::bail!("Tool server error {}: {}", err.code, err.message);
        }
        body.result
            .ok_or_else(|| anyhow::anyhow!("Tool server sent no result"))
    }

    pub async fn list_tools(&self) -> anyhow::Result<Vec<ToolInfo>> {
        let result = self.call("tools/list", json!({})).await?;
        let tools = serde_json::from_value(result["tools"].clone())?;
        Ok(tools)
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> anyhow::Result<Value> {
        self.call("tools/call", json!({ "name": name, "arguments": arguments }))
            .await
    }

    pub async fn analyze_sentiment(&self, text: &str) -> anyhow::Result<String> {
        let result = self
            .call_tool(
                "analyze_text",
                json!({ "text": text, "analysis_type": "sentiment" }),
            )
            .await?;
        Ok(sentiment_from_result(&result).unwrap_or_else(|| "neutral".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "tools/list",
            params: json!({}),
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}"#
        );
    }

    #[test]
    fn test_sentiment_extraction() {
        let structured = json!({"structuredContent": {"analysis": {"sentiment": "positive"}}});
        assert_eq!(sentiment_from_result(&structured).as_deref(), Some("positive"));

        let text_json = json!({"content": [{"type": "text", "text": "{\"analysis\":{\"sentiment\":\"negative\"}}"}]});
        assert_eq!(sentiment_from_result(&text_json).as_deref(), Some("negative"));

        let plain = json!({"content": [{"type": "text", "text": "Overall Neutral tone"}]});
        assert_eq!(sentiment_from_result(&plain).as_deref(), Some("neutral"));

        assert_eq!(sentiment_from_result(&json!({})), None);
    }

    #[test]
    fn test_tool_list_parse() {
        let tools: Vec<ToolInfo> = serde_json::from_value(json!([
            {"name": "analyze_text", "description": "Analyze text"},
            {"name": "bare"}
        ]))
        .unwrap();
        assert_eq!(tools[1].description, "");
    }

    #[tokio::test]
    async fn test_unconfigured_server() {
        let client = McpClient::new(None);
        assert!(client.list_tools().await.is_err());
    }
}
