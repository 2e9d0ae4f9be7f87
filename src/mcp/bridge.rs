//! The seam between the HTTP endpoint and whatever answers tool requests.

use async_trait::async_trait;

use crate::error::{BridgeError, Result};

/// Tool arguments as sent on the wire.
pub type ToolArguments = serde_json::Map<String, serde_json::Value>;

/// Forwards `tools/list` and `tools/call` to a tool server.
///
/// Results are the server's own payloads, untouched. Implementations must be
/// shareable across concurrent requests.
#[async_trait]
pub trait ToolBridge: Send + Sync {
    /// Fetch the server's tool catalog.
    async fn list_tools(&self) -> Result<serde_json::Value>;

    /// Invoke one tool by name.
    async fn call_tool(&self, name: &str, arguments: ToolArguments) -> Result<serde_json::Value>;
}

/// Normalize the `arguments` member of `tools/call` params.
///
/// Absent, `null` and blank strings become an empty map; a string holding a
/// JSON object is parsed. Anything else is rejected.
pub fn coerce_tool_arguments(value: Option<serde_json::Value>) -> Result<ToolArguments> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(ToolArguments::new()),
        Some(serde_json::Value::Object(map)) => Ok(map),
        Some(serde_json::Value::String(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(ToolArguments::new());
            }
            let parsed: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
                BridgeError::InvalidArgument(format!("tool arguments must be valid JSON: {e}"))
            })?;
            match parsed {
                serde_json::Value::Object(map) => Ok(map),
                other => Err(not_an_object(&other)),
            }
        }
        Some(other) => Err(not_an_object(&other)),
    }
}

fn not_an_object(value: &serde_json::Value) -> BridgeError {
    BridgeError::InvalidArgument(format!("tool arguments must be a JSON object; got {value}"))
}
