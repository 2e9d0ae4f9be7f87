//! HTTP endpoint: JSON-RPC over `POST <mcp path>` plus `GET /healthz`.
//!
//! Every JSON-RPC outcome, success or failure, is answered with HTTP 200.
//! Only the framework itself uses other statuses (oversized bodies, wrong
//! HTTP method, unknown paths).

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{BridgeConfig, HEALTH_PATH};
use crate::error::Result;
use crate::jsonrpc::{parse_body, BridgeRequest, Envelope, JsonRpcResponse};
use crate::mcp::ToolBridge;

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<dyn ToolBridge>,
}

/// Build the axum router.
pub fn router(bridge: Arc<dyn ToolBridge>, mcp_path: &str, max_body_bytes: usize) -> Router {
    Router::new()
        .route(mcp_path, post(handle_mcp_request))
        .route(HEALTH_PATH, get(healthz))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { bridge })
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(config: &BridgeConfig, bridge: Arc<dyn ToolBridge>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(bridge, &config.mcp_path, config.max_body_bytes);
    let listener = TcpListener::bind(config.listen_addr()).await?;
    info!(
        addr = %config.listen_addr(),
        "MCP HTTP bridge listening on http://localhost:{}{}",
        config.port,
        config.mcp_path
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

async fn healthz() -> &'static str {
    "ok"
}

async fn handle_mcp_request(State(state): State<AppState>, body: Bytes) -> Json<JsonRpcResponse> {
    Json(handle_body(state.bridge.as_ref(), &body).await)
}

/// Validate a raw body and answer it.
pub async fn handle_body(bridge: &dyn ToolBridge, body: &[u8]) -> JsonRpcResponse {
    let correlation_id = Uuid::new_v4();

    let envelope = match parse_body(body) {
        Ok(envelope) => envelope,
        Err(rejection) => {
            debug!(%correlation_id, error = %rejection.error, "rejected JSON-RPC envelope");
            return rejection.into();
        }
    };

    let span = info_span!(
        "jsonrpc",
        %correlation_id,
        method = %envelope.request.method_name()
    );
    dispatch(bridge, envelope).instrument(span).await
}

/// Forward a validated request and wrap the outcome.
pub async fn dispatch(bridge: &dyn ToolBridge, envelope: Envelope) -> JsonRpcResponse {
    let Envelope { id, request } = envelope;

    let outcome = match request {
        BridgeRequest::ListTools => bridge.list_tools().await,
        BridgeRequest::CallTool { name, arguments } => {
            debug!(tool = %name, "forwarding tool call");
            bridge.call_tool(&name, arguments).await
        }
        BridgeRequest::Unknown { .. } => {
            debug!("method not found");
            return JsonRpcResponse::method_not_found(id);
        }
    };

    match outcome {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => {
            warn!(%error, "tool server request failed");
            JsonRpcResponse::failure(id, &error)
        }
    }
}
