//! MCP Server implementation
//!
//! Dispatches JSON-RPC messages to the tool, resource and prompt registries
//! and runs the stdio transport. The HTTP transport lives in
//! [`crate::mcp::http`] and shares [`McpServer::handle_message`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::Result;
use crate::mcp::content::{PromptRegistry, ResourceRegistry};
use crate::mcp::registry::ToolRegistry;
use crate::mcp::types::*;

/// MCP server version
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP server over read-only registries
///
/// Requests are handled independently; share it behind an `Arc`.
#[derive(Debug)]
pub struct McpServer {
    info: ServerInfo,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    prompts: PromptRegistry,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(
        name: &str,
        tools: ToolRegistry,
        resources: ResourceRegistry,
        prompts: PromptRegistry,
    ) -> Self {
        Self {
            info: ServerInfo {
                name: name.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            tools,
            resources,
            prompts,
        }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    pub fn prompts(&self) -> &PromptRegistry {
        &self.prompts
    }

    /// Run the server on stdio, one JSON-RPC message per line
    pub async fn run_stdio(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        tracing::info!(name = %self.info.name, "MCP server listening on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(&line) {
                let mut response_str = serde_json::to_string(&response)?;
                response_str.push('\n');
                stdout.write_all(response_str.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        tracing::info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Handle a raw JSON-RPC message; `None` for notifications
    pub fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(message) {
            Ok(v) => v,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request),
            Err(e) => Some(JsonRpcResponse::error(
                None,
                JsonRpcError::invalid_request(e.to_string()),
            )),
        }
    }

    /// Handle a parsed request; `None` for notifications
    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!(method = %request.method, id = ?request.id, "handling request");

        if request.is_notification() {
            if request.method != methods::INITIALIZED {
                tracing::debug!(method = %request.method, "ignoring notification");
            }
            return None;
        }

        let id = request.id.clone();
        let outcome = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(&request),
            methods::PING => Ok(serde_json::json!({})),
            methods::LIST_TOOLS => to_result(ListToolsResult {
                tools: self.tools.tools(),
            }),
            methods::CALL_TOOL => self.handle_call_tool(&request),
            methods::LIST_RESOURCES => to_result(ListResourcesResult {
                resources: self.resources.list(),
            }),
            methods::READ_RESOURCE => self.handle_read_resource(&request),
            methods::LIST_PROMPTS => to_result(ListPromptsResult {
                prompts: self.prompts.list(),
            }),
            methods::GET_PROMPT => self.handle_get_prompt(&request),
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    /// Handle initialize request
    fn handle_initialize(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        if let Ok(params) = params::<InitializeParams>(request) {
            tracing::info!(
                client = %params.client_info.name,
                protocol = %params.protocol_version,
                "client initializing"
            );
        }

        to_result(InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: self.info.clone(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                resources: Some(ResourcesCapability::default()),
                prompts: Some(PromptsCapability::default()),
            },
        })
    }

    /// Handle call tool request
    ///
    /// Unknown tools and bad arguments are reported in the result with
    /// `isError`, not as JSON-RPC errors.
    fn handle_call_tool(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = params(request)?;

        let result = match self.tools.invoke(&params.name, params.arguments) {
            Ok(value) => CallToolResult::structured(value),
            Err(e) => {
                tracing::warn!(tool = %params.name, error = %e, "tool call failed");
                CallToolResult::error(&e)
            }
        };
        to_result(result)
    }

    fn handle_read_resource(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        let params: ReadResourceParams = params(request)?;
        let content = self.resources.read(&params.uri)?;
        to_result(ReadResourceResult {
            contents: vec![content],
        })
    }

    fn handle_get_prompt(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        let params: GetPromptParams = params(request)?;
        let prompt = self
            .prompts
            .get(&params.name)
            .ok_or_else(|| crate::error::McpError::PromptNotFound {
                name: params.name.clone(),
            })?;
        let text = prompt.render(&params.arguments)?;

        to_result(GetPromptResult {
            description: Some(prompt.description.clone()),
            messages: vec![PromptMessage {
                role: "user".to_string(),
                content: ToolResultContent::Text { text },
            }],
        })
    }
}

fn params<T: DeserializeOwned>(request: &JsonRpcRequest) -> std::result::Result<T, JsonRpcError> {
    let value = request
        .params
        .clone()
        .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
    serde_json::from_value(value).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
}

fn to_result<T: Serialize>(value: T) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}
