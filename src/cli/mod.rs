//! Command-line flags.

use clap::Parser;

use crate::config::Overrides;

/// Serve a stdio MCP tool server over HTTP JSON-RPC.
///
/// Flags override the matching environment variables. The token is only read
/// from GITHUB_PERSONAL_ACCESS_TOKEN.
#[derive(Parser, Debug, Default)]
#[command(name = "mcp-http-bridge", version, about)]
pub struct Cli {
    /// Address to bind (env: HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (env: PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path of the JSON-RPC endpoint (env: MCP_PATH)
    #[arg(long)]
    pub path: Option<String>,

    /// Tool server executable (env: GITHUB_MCP_CMD)
    #[arg(long)]
    pub command: Option<String>,

    /// Tool server argument, repeatable (env: GITHUB_MCP_ARGS)
    #[arg(long = "arg", allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl From<Cli> for Overrides {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            mcp_path: cli.path,
            command: cli.command,
            args: cli.args,
        }
    }
}
