//! Stdio transport: spawns the tool server with piped stdin/stdout.

use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::config::{BridgeConfig, TOKEN_ENV};
use crate::error::{BridgeError, Result};

/// Command line and credential for the MCP server subprocess.
#[derive(Clone)]
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl StdioTransport {
    /// Create a stdio transport from command and args.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: Vec::new(),
        }
    }

    /// Transport for the configured server with the token injected.
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone()).with_env(TOKEN_ENV, &config.token)
    }

    /// Add an environment variable on top of the inherited environment.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }

    /// Spawn the child. stdin/stdout become the transport, stderr is inherited.
    /// The child is killed if the handle is dropped.
    pub fn spawn(&self) -> Result<Child> {
        self.build_command().spawn().map_err(|error| {
            BridgeError::Stream(format!(
                "failed to spawn MCP server `{}`: {error}",
                self.command
            ))
        })
    }
}
