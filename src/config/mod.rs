//! Configuration (layered: CLI flags > environment > `.env` file > defaults).

use std::fmt;

use crate::error::{BridgeError, Result};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3333;
pub const DEFAULT_MCP_PATH: &str = "/mcp";
pub const DEFAULT_MCP_COMMAND: &str = "npx";
pub const DEFAULT_MCP_ARGS: &str = "@github/github-mcp-server";
pub const HEALTH_PATH: &str = "/healthz";

/// Request bodies above this size are refused by the HTTP layer.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Environment variable carrying the credential handed to the subprocess.
pub const TOKEN_ENV: &str = "GITHUB_PERSONAL_ACCESS_TOKEN";

/// Everything the bridge needs to spawn the tool server and serve HTTP.
#[derive(Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    pub mcp_path: String,
    pub token: String,
    pub command: String,
    pub args: Vec<String>,
    pub max_body_bytes: usize,
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("mcp_path", &self.mcp_path)
            .field("token", &"..")
            .field("command", &self.command)
            .field("args", &self.args)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

/// Command-line overrides; `None` / empty leaves the environment value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub mcp_path: Option<String>,
    pub command: Option<String>,
    pub args: Vec<String>,
}

impl BridgeConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let token = get(TOKEN_ENV)
            .ok_or_else(|| BridgeError::Configuration(format!("Missing env var: {TOKEN_ENV}")))?;

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                BridgeError::Configuration(format!("PORT must be a valid port number, got {raw:?}"))
            })?,
            None => DEFAULT_PORT,
        };

        let config = Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port,
            mcp_path: get("MCP_PATH").unwrap_or_else(|| DEFAULT_MCP_PATH.into()),
            token,
            command: get("GITHUB_MCP_CMD").unwrap_or_else(|| DEFAULT_MCP_COMMAND.into()),
            args: split_args(&get("GITHUB_MCP_ARGS").unwrap_or_else(|| DEFAULT_MCP_ARGS.into())),
            max_body_bytes: MAX_BODY_BYTES,
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides and re-validate.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(path) = overrides.mcp_path {
            self.mcp_path = path;
        }
        if let Some(command) = overrides.command {
            self.command = command;
        }
        if !overrides.args.is_empty() {
            self.args = overrides.args;
        }
        self.validate()?;
        Ok(self)
    }

    /// Socket address string for the HTTP listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<()> {
        if !self.mcp_path.starts_with('/') {
            return Err(BridgeError::Configuration(format!(
                "MCP_PATH must start with '/', got {:?}",
                self.mcp_path
            )));
        }
        if self.mcp_path == HEALTH_PATH {
            return Err(BridgeError::Configuration(format!(
                "MCP_PATH must not be {HEALTH_PATH}"
            )));
        }
        if self.command.is_empty() {
            return Err(BridgeError::Configuration("MCP command is empty".into()));
        }
        Ok(())
    }
}

/// Split on single spaces. No quoting; consecutive spaces yield empty arguments.
pub fn split_args(raw: &str) -> Vec<String> {
    raw.split(' ').map(str::to_owned).collect()
}
