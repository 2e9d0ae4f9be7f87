//! Shared test helpers: a recording fake bridge and a scripted MCP server.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tower::ServiceExt;

use mcp_http_bridge::error::{BridgeError, Result};
use mcp_http_bridge::mcp::{ToolArguments, ToolBridge};

/// A bridge that returns canned payloads and records every call.
pub struct FakeBridge {
    catalog: Value,
    call_result: Value,
    failure: Option<String>,
    list_calls: Mutex<usize>,
    calls: Mutex<Vec<(String, ToolArguments)>>,
}

impl FakeBridge {
    pub fn new(catalog: Value, call_result: Value) -> Self {
        Self {
            catalog,
            call_result,
            failure: None,
            list_calls: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with a stream error carrying `message`.
    pub fn failing(message: &str) -> Self {
        let mut bridge = Self::new(Value::Null, Value::Null);
        bridge.failure = Some(message.to_string());
        bridge
    }

    pub fn calls(&self) -> Vec<(String, ToolArguments)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    fn check_failure(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(BridgeError::Stream(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ToolBridge for FakeBridge {
    async fn list_tools(&self) -> Result<Value> {
        *self.list_calls.lock().unwrap() += 1;
        self.check_failure()?;
        Ok(self.catalog.clone())
    }

    async fn call_tool(&self, name: &str, arguments: ToolArguments) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        self.check_failure()?;
        Ok(self.call_result.clone())
    }
}

pub fn sample_catalog() -> Value {
    json!({
        "tools": [
            {
                "name": "create_issue",
                "description": "Create a GitHub issue",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "owner": { "type": "string" },
                        "repo": { "type": "string" },
                        "title": { "type": "string" }
                    },
                    "required": ["owner", "repo", "title"]
                }
            },
            {
                "name": "echo",
                "inputSchema": { "type": "object" }
            }
        ],
        "nextCursor": "page-2"
    })
}

pub fn sample_call_result() -> Value {
    json!({
        "content": [{ "type": "text", "text": "{\"number\":42}" }],
        "isError": false
    })
}

/// POST `body` to `path` and decode the JSON reply.
pub async fn post_json(router: Router, path: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("Content-Type", "application/json")
        .body(body.into())
        .expect("should build request");

    let response = router.oneshot(request).await.expect("should get response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("should collect body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Issue a bodiless request and return the status and text body.
pub async fn send_empty(router: Router, method: &str, path: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("should build request");

    let response = router.oneshot(request).await.expect("should get response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("should collect body")
        .to_bytes();
    (status, String::from_utf8(bytes.to_vec()).expect("should be utf8"))
}

/// Catalog served by [`run_scripted_server`], vendor members included.
pub fn scripted_catalog() -> Value {
    json!({
        "tools": [{
            "name": "echo",
            "description": "Echo arguments back",
            "inputSchema": { "type": "object" },
            "x-vendor": { "scopes": ["repo"] }
        }],
        "x-server-extra": 7
    })
}

/// Minimal MCP server speaking newline-delimited JSON-RPC over `stream`.
///
/// Knows one tool, `echo`, which returns its arguments as structured content
/// plus an `x-trace` vendor member. Any other tool name is answered with a
/// JSON-RPC error.
pub async fn run_scripted_server(stream: DuplexStream) {
    let (read, mut write) = tokio::io::split(stream);
    let mut lines = BufReader::new(read).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let Ok(message) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        // Notifications and responses carry nothing to answer.
        let (Some(id), Some(method)) = (message.get("id").cloned(), message["method"].as_str())
        else {
            continue;
        };

        let reply = match method {
            "initialize" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": message["params"]["protocolVersion"].clone(),
                    "capabilities": { "tools": { "listChanged": false } },
                    "serverInfo": { "name": "scripted", "version": "0.0.1" }
                }
            }),
            "tools/list" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": scripted_catalog()
            }),
            "tools/call" => {
                let name = message["params"]["name"].as_str().unwrap_or_default();
                let arguments = message["params"]["arguments"].clone();
                if name == "echo" {
                    json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "result": {
                            "content": [{ "type": "text", "text": arguments.to_string() }],
                            "structuredContent": arguments,
                            "isError": false,
                            "x-trace": "abc"
                        }
                    })
                } else {
                    json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": { "code": -32602, "message": format!("Unknown tool: {name}") }
                    })
                }
            }
            _ => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": "Method not found" }
            }),
        };

        let mut encoded = reply.to_string();
        encoded.push('\n');
        if write.write_all(encoded.as_bytes()).await.is_err() {
            break;
        }
        let _ = write.flush().await;
    }
}
