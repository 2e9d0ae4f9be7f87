//! Model Context Protocol (MCP) client side of the bridge.

pub mod bridge;
pub mod capture;
pub mod client;
pub mod transport;

pub use bridge::{coerce_tool_arguments, ToolArguments, ToolBridge};
pub use client::McpBridgeClient;
pub use transport::StdioTransport;
