//! MCP client
//!
//! A [`McpClient`] only exists in the connected state: [`McpClient::connect`]
//! performs the handshake and the one-time tool discovery, and
//! [`McpClient::disconnect`] consumes it. Nothing is retried; a broken
//! connection surfaces to the caller.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::{ConnectionError, McpError, Result};
use crate::mcp::server::McpServer;
use crate::mcp::types::*;

const CLIENT_NAME: &str = "mcp-demo-client";

/// JSON-RPC over HTTP POST
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http_client: reqwest::Client::builder().timeout(timeout).build()?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, request: &JsonRpcRequest) -> Result<Option<JsonRpcResponse>> {
        let response = self
            .http_client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::ACCEPTED {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ConnectionError::BadStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = response
            .json::<JsonRpcResponse>()
            .await
            .map_err(|e| self.connection_error(e))?;
        Ok(Some(body))
    }

    fn connection_error(&self, err: reqwest::Error) -> ConnectionError {
        if err.is_timeout() {
            ConnectionError::Timeout {
                url: self.url.clone(),
            }
        } else {
            ConnectionError::Unreachable {
                url: self.url.clone(),
                message: err.to_string(),
            }
        }
    }
}

/// How requests reach the server
#[derive(Debug, Clone)]
pub enum Transport {
    Http(HttpTransport),
    /// Direct calls into a server in the same process
    InProcess(Arc<McpServer>),
}

impl Transport {
    pub fn http(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Transport::Http(HttpTransport::new(url, timeout)?))
    }

    fn describe(&self) -> String {
        match self {
            Transport::Http(http) => http.url().to_string(),
            Transport::InProcess(server) => format!("in-process:{}", server.info().name),
        }
    }

    async fn send(&self, request: JsonRpcRequest) -> Result<Option<JsonRpcResponse>> {
        match self {
            Transport::Http(http) => http.send(&request).await,
            Transport::InProcess(server) => Ok(server.handle_request(request)),
        }
    }
}

/// Connected MCP client session
#[derive(Debug)]
pub struct McpClient {
    transport: Transport,
    server_info: ServerInfo,
    tools: Vec<Tool>,
    next_id: AtomicI64,
}

impl McpClient {
    /// Handshake and discover the server's tools
    pub async fn connect(transport: Transport) -> Result<Self> {
        tracing::debug!(server = %transport.describe(), "connecting to MCP server");

        let mut client = Self {
            transport,
            server_info: ServerInfo {
                name: String::new(),
                version: String::new(),
            },
            tools: Vec::new(),
            next_id: AtomicI64::new(1),
        };

        let init: InitializeResult = client
            .request(
                methods::INITIALIZE,
                Some(json!({
                    "protocolVersion": MCP_VERSION,
                    "clientInfo": {"name": CLIENT_NAME, "version": env!("CARGO_PKG_VERSION")},
                    "capabilities": {},
                })),
            )
            .await?;
        client.server_info = init.server_info;
        client
            .transport
            .send(JsonRpcRequest::notification(methods::INITIALIZED))
            .await?;

        client.tools = client.list_tools().await?;
        tracing::info!(
            server = %client.server_info.name,
            tools = client.tools.len(),
            "connected to MCP server"
        );
        Ok(client)
    }

    /// Connect over HTTP
    pub async fn connect_http(url: &str, timeout: Duration) -> Result<Self> {
        Self::connect(Transport::http(url, timeout)?).await
    }

    /// Connect to a server in this process
    pub async fn connect_in_process(server: Arc<McpServer>) -> Result<Self> {
        Self::connect(Transport::InProcess(server)).await
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Tools discovered at connect time
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Fetch the tool list again
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let result: ListToolsResult = self.request(methods::LIST_TOOLS, None).await?;
        Ok(result.tools)
    }

    pub async fn ping(&self) -> Result<()> {
        let _: Value = self.request(methods::PING, None).await?;
        Ok(())
    }

    /// Raw `tools/call`
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        self.request(
            methods::CALL_TOOL,
            Some(json!({"name": name, "arguments": arguments})),
        )
        .await
    }

    /// `tools/call` with in-band failures turned into errors
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<Value> {
        let result = self.call_tool(name, arguments).await?;
        let kind = result.error_kind();
        match result.into_invocation() {
            Invocation::Ok { result } => Ok(result),
            Invocation::Error { error } => Err(McpError::ToolFailed {
                kind,
                message: error,
            }
            .into()),
        }
    }

    pub async fn list_resources(&self) -> Result<Vec<Resource>> {
        let result: ListResourcesResult = self.request(methods::LIST_RESOURCES, None).await?;
        Ok(result.resources)
    }

    pub async fn read_resource(&self, uri: &str) -> Result<ResourceContent> {
        let result: ReadResourceResult = self
            .request(methods::READ_RESOURCE, Some(json!({"uri": uri})))
            .await?;
        result.contents.into_iter().next().ok_or_else(|| {
            McpError::Protocol {
                message: format!("empty contents for {}", uri),
            }
            .into()
        })
    }

    pub async fn list_prompts(&self) -> Result<Vec<Prompt>> {
        let result: ListPromptsResult = self.request(methods::LIST_PROMPTS, None).await?;
        Ok(result.prompts)
    }

    pub async fn get_prompt(&self, name: &str, arguments: Map<String, Value>) -> Result<GetPromptResult> {
        self.request(
            methods::GET_PROMPT,
            Some(json!({"name": name, "arguments": arguments})),
        )
        .await
    }

    /// End the session
    pub fn disconnect(self) {
        tracing::debug!(server = %self.server_info.name, "disconnected from MCP server");
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Option<Value>) -> Result<T> {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = JsonRpcRequest::new(id.clone(), method, params);

        let response = self.transport.send(request).await?.ok_or_else(|| McpError::Protocol {
            message: format!("no response to {}", method),
        })?;

        if response.id.as_ref() != Some(&id) {
            return Err(McpError::Protocol {
                message: format!("response id {:?} does not match request {:?}", response.id, id),
            }
            .into());
        }
        if let Some(error) = response.error {
            return Err(McpError::from(error).into());
        }

        let result = response.result.unwrap_or(Value::Null);
        Ok(serde_json::from_value(result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::error::{DemoError, ErrorKind};

    async fn client() -> McpClient {
        let server = Arc::new(catalog::demo_server().unwrap());
        McpClient::connect_in_process(server).await.unwrap()
    }

    #[tokio::test]
    async fn test_connect_discovers_tools() {
        let client = client().await;
        assert_eq!(client.server_info().name, "DemoMCPServer");
        assert_eq!(client.tools().len(), 5);
    }

    #[tokio::test]
    async fn test_discovery_is_stable() {
        let client = client().await;
        let first = client.list_tools().await.unwrap();
        let second = client.list_tools().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_slice(), client.tools());
    }

    #[tokio::test]
    async fn test_invoke_success_and_failure() {
        let client = client().await;
        let result = client.invoke("add", json!({"a": 2, "b": 3})).await.unwrap();
        assert_eq!(result, json!(5));

        let err = client.invoke("add", json!({"a": 2})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().ends_with("missing required parameter: b"));

        let err = client.invoke("subtract", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_read_resource_not_found() {
        let client = client().await;
        let err = client.read_resource("demo://nope").await.unwrap_err();
        assert!(matches!(err, DemoError::Mcp(McpError::Rpc { .. })));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_connect_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = format!("http://127.0.0.1:{}/mcp", port);
        let err = McpClient::connect_http(&url, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }
}
