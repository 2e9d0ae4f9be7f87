//! MCP client holding the one shared session with the tool server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rmcp::{
    model::{
        CallToolRequest, CallToolRequestParams, ClientInfo, ClientRequest, ListToolsRequest,
        ProtocolVersion, ServerResult,
    },
    service::{DynService, Peer, PeerRequestOptions, RoleClient, RunningService, ServiceExt},
};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Child;
use tracing::{debug, info, warn};

use super::bridge::{ToolArguments, ToolBridge};
use super::capture::{RawResults, RecordingReader};
use super::transport::StdioTransport;
use crate::error::{map_client_initialize_error, map_service_error, BridgeError, Result};

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type MCPRunningService = RunningService<RoleClient, DynClientService>;

/// How long a closed child gets to exit on its own before it is killed.
const CHILD_EXIT_GRACE: Duration = Duration::from_secs(3);

/// Client for a Model Context Protocol server.
///
/// Requests go through a cloned [`Peer`], so concurrent callers never wait on
/// each other; rmcp matches responses to requests by id. Results are returned
/// as the server sent them, including members rmcp's typed results do not
/// model. The running service and child are kept only to end the session.
pub struct McpBridgeClient {
    peer: Peer<RoleClient>,
    raw: Arc<RawResults>,
    closed: AtomicBool,
    session: Mutex<Option<MCPRunningService>>,
    child: Mutex<Option<Child>>,
}

impl McpBridgeClient {
    /// Identity announced in the initialize handshake.
    pub fn client_info() -> ClientInfo {
        let mut info = ClientInfo {
            protocol_version: ProtocolVersion::LATEST,
            ..Default::default()
        };
        info.client_info.name = env!("CARGO_PKG_NAME").into();
        info.client_info.version = env!("CARGO_PKG_VERSION").into();
        info
    }

    /// Spawn the configured server and complete the MCP handshake.
    pub async fn spawn(transport: &StdioTransport) -> Result<Self> {
        info!(
            command = %transport.command(),
            args = ?transport.args(),
            "spawning MCP server"
        );
        let mut child = transport.spawn()?;
        let (Some(stdout), Some(stdin)) = (child.stdout.take(), child.stdin.take()) else {
            return Err(BridgeError::Stream("MCP server stdio was not piped".into()));
        };
        let client = Self::connect(stdout, stdin).await?;
        *lock(&client.child) = Some(child);
        Ok(client)
    }

    /// Complete the MCP handshake over a newline-delimited JSON-RPC stream.
    pub async fn connect<R, W>(read: R, write: W) -> Result<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let raw = Arc::new(RawResults::new());
        let read = RecordingReader::new(read, raw.clone());
        let session = Self::client_info()
            .into_dyn()
            .serve((read, write))
            .await
            .map_err(map_client_initialize_error)?;
        // The initialize result is consumed by rmcp, not by a caller.
        raw.clear();

        if let Some(server) = session.peer_info() {
            info!(
                server = %server.server_info.name,
                version = %server.server_info.version,
                "MCP session initialized"
            );
        }

        Ok(Self {
            peer: session.peer().clone(),
            raw,
            closed: AtomicBool::new(false),
            session: Mutex::new(Some(session)),
            child: Mutex::new(None),
        })
    }

    /// Whether the session has ended, either by [`close`](Self::close) or
    /// because the server went away.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.peer.is_transport_closed()
    }

    /// End the session and reap the child process, if there is one.
    ///
    /// Requests already in flight are not blocked by this; they fail with a
    /// closed-session error once the transport goes away.
    pub async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        let session = lock(&self.session).take();
        let child = lock(&self.child).take();

        if let Some(session) = session {
            let reason = session
                .cancel()
                .await
                .map_err(|e| BridgeError::Stream(format!("MCP session shutdown failed: {e}")))?;
            debug!(?reason, "MCP session closed");
        }
        if let Some(child) = child {
            reap(child).await?;
        }
        self.raw.clear();
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(BridgeError::SessionClosed);
        }
        Ok(())
    }

    /// Send one request and return the typed response alongside the raw
    /// `result` the server put on the wire.
    async fn request(
        &self,
        context: &'static str,
        request: ClientRequest,
    ) -> Result<(ServerResult, Option<Value>)> {
        self.ensure_open()?;
        let handle = self
            .peer
            .send_request_with_option(request, PeerRequestOptions::no_options())
            .await
            .map_err(|e| map_service_error(context, e))?;
        let id = handle.id.clone();
        let response = handle.await_response().await;
        let raw = self.raw.take(&id);
        let response = response.map_err(|e| map_service_error(context, e))?;
        Ok((response, raw))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn reap(mut child: Child) -> Result<()> {
    match tokio::time::timeout(CHILD_EXIT_GRACE, child.wait()).await {
        Ok(status) => {
            let status = status?;
            debug!(%status, "MCP server exited");
        }
        Err(_) => {
            warn!("MCP server did not exit after close; killing it");
            child.kill().await?;
        }
    }
    Ok(())
}

/// Prefer the payload exactly as received; fall back to re-serializing the
/// typed result when no raw payload was recorded.
fn pass_through<T: serde::Serialize>(raw: Option<Value>, typed: T) -> Result<Value> {
    match raw {
        Some(raw) => Ok(raw),
        None => Ok(serde_json::to_value(typed)?),
    }
}

#[async_trait]
impl ToolBridge for McpBridgeClient {
    async fn list_tools(&self) -> Result<Value> {
        let request = ClientRequest::ListToolsRequest(ListToolsRequest {
            method: Default::default(),
            params: None,
            extensions: Default::default(),
        });
        match self.request("tools/list", request).await? {
            (ServerResult::ListToolsResult(page), raw) => pass_through(raw, page),
            _ => Err(map_service_error(
                "tools/list",
                rmcp::ServiceError::UnexpectedResponse,
            )),
        }
    }

    async fn call_tool(&self, name: &str, arguments: ToolArguments) -> Result<Value> {
        let request = ClientRequest::CallToolRequest(CallToolRequest::new(CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: Some(arguments),
            task: None,
        }));
        match self.request("tools/call", request).await? {
            (ServerResult::CallToolResult(result), raw) => pass_through(raw, result),
            _ => Err(map_service_error(
                "tools/call",
                rmcp::ServiceError::UnexpectedResponse,
            )),
        }
    }
}
