//! Error types for the bridge.

use rmcp::service::{ClientInitializeError, ServiceError};
use thiserror::Error;

/// JSON-RPC code for every failure raised by the bridge itself or by the
/// subprocess behind it.
pub const SERVER_ERROR: i32 = -32000;

/// JSON-RPC code for methods other than `tools/list` and `tools/call`.
pub const METHOD_NOT_FOUND: i32 = -32601;

/// JSON-RPC code for bodies that are not JSON at all.
pub const PARSE_ERROR: i32 = -32700;

/// Primary error type for all bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid jsonrpc version")]
    InvalidVersion,

    #[error("Missing id")]
    MissingId,

    #[error("Missing tool name")]
    MissingToolName,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Parse error")]
    Parse,

    #[error("MCP error {code}: {message}")]
    Protocol { code: i32, message: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("MCP session is closed")]
    SessionClosed,

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// The JSON-RPC error code this error is reported with.
    pub fn code(&self) -> i32 {
        match self {
            Self::Parse => PARSE_ERROR,
            _ => SERVER_ERROR,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, BridgeError>;

pub(crate) fn map_client_initialize_error(error: ClientInitializeError) -> BridgeError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            BridgeError::Stream(format!("MCP initialize connection closed: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => BridgeError::Stream(
            format!("MCP initialize transport error ({context}): {error}"),
        ),
        ClientInitializeError::JsonRpcError(error) => BridgeError::Protocol {
            code: error.code.0,
            message: error.message.to_string(),
        },
        ClientInitializeError::Cancelled => {
            BridgeError::Stream("MCP initialize cancelled".into())
        }
        other => BridgeError::Stream(format!("MCP initialize error: {other}")),
    }
}

pub(crate) fn map_service_error(context: &str, error: ServiceError) -> BridgeError {
    match error {
        ServiceError::McpError(error) => BridgeError::Protocol {
            code: error.code.0,
            message: error.message.to_string(),
        },
        ServiceError::TransportSend(error) => {
            BridgeError::Stream(format!("{context}: MCP transport send failed: {error}"))
        }
        ServiceError::TransportClosed => BridgeError::SessionClosed,
        ServiceError::UnexpectedResponse => {
            BridgeError::Stream(format!("{context}: unexpected MCP response"))
        }
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            BridgeError::Stream(format!("{context}: MCP request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => BridgeError::Timeout(timeout.as_millis() as u64),
        other => BridgeError::Stream(format!("{context}: MCP service error: {other}")),
    }
}
