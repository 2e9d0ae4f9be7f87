//! MCP HTTP bridge
//!
//! Spawns a Model Context Protocol server that speaks JSON-RPC over
//! stdin/stdout and re-exposes its `tools/list` and `tools/call` methods on a
//! single HTTP JSON-RPC endpoint.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use mcp_http_bridge::{config::BridgeConfig, mcp::{McpBridgeClient, StdioTransport}};
//!
//! # async fn example() -> mcp_http_bridge::error::Result<()> {
//! let config = BridgeConfig::from_env()?;
//! let client = McpBridgeClient::spawn(&StdioTransport::from_config(&config)).await?;
//! mcp_http_bridge::server::serve(&config, Arc::new(client), std::future::pending()).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod mcp;
pub mod server;
