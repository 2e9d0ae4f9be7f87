//! JSON-RPC 2.0 envelopes for the HTTP endpoint.
//!
//! Incoming bodies are validated once, here, into a [`BridgeRequest`]. The
//! checks run in a fixed order: version, then id, then method specific
//! params. The first failure wins.
//!
//! # Ids
//!
//! The request id is echoed back verbatim, whatever its JSON type. When the id
//! is absent or `null`, error responses carry the string `"1"` instead of
//! `null`.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::error::{BridgeError, METHOD_NOT_FOUND};
use crate::mcp::bridge::{coerce_tool_arguments, ToolArguments};

/// JSON-RPC 2.0 version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// Id used in error responses when the request carried none.
pub const FALLBACK_ID: &str = "1";

/// Methods the bridge forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Method {
    #[strum(serialize = "tools/list")]
    ListTools,
    #[strum(serialize = "tools/call")]
    CallTool,
}

/// A validated request, one variant per branch of the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeRequest {
    ListTools,
    CallTool {
        name: String,
        arguments: ToolArguments,
    },
    /// Any other method, or no usable method at all.
    Unknown { method: Option<String> },
}

impl BridgeRequest {
    /// Method name for logs.
    pub fn method_name(&self) -> &str {
        match self {
            Self::ListTools => "tools/list",
            Self::CallTool { .. } => "tools/call",
            Self::Unknown { method } => method.as_deref().unwrap_or("<none>"),
        }
    }
}

/// A request that passed validation, with the id to answer under.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub id: Value,
    pub request: BridgeRequest,
}

/// A request that failed validation, with the id to answer under.
#[derive(Debug)]
pub struct Rejection {
    pub id: Value,
    pub error: BridgeError,
}

/// Wire shape before validation. Every member is optional and untyped so that
/// malformed input still yields a well-formed error response.
#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    jsonrpc: Option<Value>,
    id: Option<Value>,
    method: Option<Value>,
    params: Option<Value>,
}

pub fn fallback_id() -> Value {
    Value::String(FALLBACK_ID.into())
}

fn response_id(id: &Option<Value>) -> Value {
    id.clone().unwrap_or_else(fallback_id)
}

/// Falsy ids count as missing: `null`, `false`, zero and `""`.
fn is_missing_id(id: &Value) -> bool {
    match id {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Parse and validate a raw HTTP body.
///
/// A blank body is treated as `{}`. Bodies that are not JSON are rejected with
/// [`BridgeError::Parse`].
pub fn parse_body(body: &[u8]) -> Result<Envelope, Rejection> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Envelope::from_value(Value::Object(Default::default()));
    }
    let value: Value = serde_json::from_slice(body).map_err(|_| Rejection {
        id: fallback_id(),
        error: BridgeError::Parse,
    })?;
    Envelope::from_value(value)
}

impl Envelope {
    /// Validate an already-parsed JSON body.
    ///
    /// Non-object bodies are treated as an object with no members.
    pub fn from_value(value: Value) -> Result<Self, Rejection> {
        let raw: RawEnvelope = serde_json::from_value(value).unwrap_or_default();

        if raw.jsonrpc.as_ref().and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err(Rejection {
                id: response_id(&raw.id),
                error: BridgeError::InvalidVersion,
            });
        }

        let id = match raw.id {
            Some(id) if !is_missing_id(&id) => id,
            other => {
                return Err(Rejection {
                    id: response_id(&other),
                    error: BridgeError::MissingId,
                })
            }
        };

        let method = raw.method.as_ref().and_then(Value::as_str);
        let request = match method.map(str::parse::<Method>) {
            Some(Ok(Method::ListTools)) => BridgeRequest::ListTools,
            Some(Ok(Method::CallTool)) => match parse_call_params(raw.params) {
                Ok(request) => request,
                Err(error) => return Err(Rejection { id, error }),
            },
            _ => BridgeRequest::Unknown {
                method: method.map(str::to_owned),
            },
        };

        Ok(Self { id, request })
    }
}

fn parse_call_params(params: Option<Value>) -> Result<BridgeRequest, BridgeError> {
    let mut params = match params {
        Some(Value::Object(map)) => map,
        _ => return Err(BridgeError::MissingToolName),
    };

    let name = match params.remove("name") {
        Some(Value::String(name)) if !name.is_empty() => name,
        _ => return Err(BridgeError::MissingToolName),
    };
    let arguments = coerce_tool_arguments(params.remove("arguments"))?;

    Ok(BridgeRequest::CallTool { name, arguments })
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl From<&BridgeError> for JsonRpcError {
    fn from(error: &BridgeError) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
        }
    }
}

/// JSON-RPC 2.0 response. Exactly one of `result` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(JSONRPC_VERSION),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(JSONRPC_VERSION),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn failure(id: Value, error: &BridgeError) -> Self {
        Self::error(id, error.into())
    }

    pub fn method_not_found(id: Value) -> Self {
        Self::error(
            id,
            JsonRpcError {
                code: METHOD_NOT_FOUND,
                message: "Method not found".into(),
            },
        )
    }
}

impl From<Rejection> for JsonRpcResponse {
    fn from(rejection: Rejection) -> Self {
        Self::failure(rejection.id, &rejection.error)
    }
}
