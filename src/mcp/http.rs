//! HTTP transport
//!
//! `POST /mcp` takes one JSON-RPC message and answers with one JSON-RPC
//! response (`202 Accepted` for notifications). `GET /health` reports the
//! server identity for process control.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::config::paths;
use crate::error::{Result, ServerError};
use crate::mcp::server::McpServer;

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Health {
    pub status: String,
    pub name: String,
    pub version: String,
}

/// Router exposing `server`
pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route(paths::MCP, post(handle_rpc))
        .route(paths::HEALTH, get(health))
        .with_state(server)
}

async fn handle_rpc(State(server): State<Arc<McpServer>>, body: String) -> Response {
    match server.handle_message(&body) {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn health(State(server): State<Arc<McpServer>>) -> Json<Health> {
    let info = server.info();
    Json(Health {
        status: "ok".to_string(),
        name: info.name.clone(),
        version: info.version.clone(),
    })
}

/// Bind `host:port`, explaining who holds the port if it is taken
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    match TcpListener::bind((host, port)).await {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            let probe_host = match host {
                "0.0.0.0" | "::" => "127.0.0.1",
                other => other,
            };
            let probe = format!("http://{}:{}{}", probe_host, port, paths::HEALTH);
            let mcp_server_running = probe_health(&probe, Duration::from_secs(2)).await.is_some();
            Err(ServerError::PortInUse {
                port,
                mcp_server_running,
            }
            .into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, server: Arc<McpServer>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = listener.local_addr()?;
    tracing::info!(
        %addr,
        name = %server.info().name,
        tools = server.tools().len(),
        resources = server.resources().len(),
        prompts = server.prompts().len(),
        "MCP server listening on http://{}{}",
        addr,
        paths::MCP
    );

    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("MCP server stopped");
    Ok(())
}

/// Fetch `/health`; `None` when nothing healthy answers
pub async fn probe_health(url: &str, timeout: Duration) -> Option<Health> {
    let client = reqwest::Client::builder().timeout(timeout).build().ok()?;
    let response = client.get(url).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    response.json::<Health>().await.ok()
}
