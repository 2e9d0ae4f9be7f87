//! Bridge binary entry point.

use std::sync::Arc;

use clap::Parser;
use mcp_http_bridge::cli::Cli;
use mcp_http_bridge::config::BridgeConfig;
use mcp_http_bridge::mcp::{McpBridgeClient, StdioTransport, ToolBridge};
use tracing::warn;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match BridgeConfig::from_env().and_then(|c| c.with_overrides(cli.into())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(config: BridgeConfig) -> mcp_http_bridge::error::Result<()> {
    let client = Arc::new(McpBridgeClient::spawn(&StdioTransport::from_config(&config)).await?);
    let bridge: Arc<dyn ToolBridge> = client.clone();

    let served =
        mcp_http_bridge::server::serve(&config, bridge, mcp_http_bridge::server::shutdown_signal())
            .await;

    if let Err(error) = client.close().await {
        warn!(%error, "failed to close MCP session");
    }
    served
}
