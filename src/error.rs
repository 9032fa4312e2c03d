//! Error types for the MCP demo
//!
//! This module defines the error hierarchy shared by the server, the client
//! and the LLM bridge. Every error is scoped to a single request/response
//! cycle; nothing here is fatal to the process.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the MCP demo
#[derive(Error, Debug)]
pub enum DemoError {
    /// Registry lookups, argument validation and protocol errors
    #[error("MCP error: {0}")]
    Mcp(#[from] McpError),

    /// The client could not reach the server
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// The LLM request failed or returned something unusable
    #[error("LLM error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Server process errors
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse classification of a failure, carried over the wire for tool errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Connection,
    Upstream,
    Internal,
}

/// MCP registry and protocol errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum McpError {
    #[error("tool not found: {name}")]
    ToolNotFound { name: String },

    #[error("resource not found: {uri}")]
    ResourceNotFound { uri: String },

    #[error("prompt not found: {name}")]
    PromptNotFound { name: String },

    #[error("missing required parameter: {name}")]
    MissingParameter { name: String },

    #[error("invalid parameter {name}: expected {expected}")]
    InvalidParameter { name: String, expected: String },

    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("tool already registered: {name}")]
    DuplicateTool { name: String },

    #[error("resource already registered: {uri}")]
    DuplicateResource { uri: String },

    #[error("prompt already registered: {name}")]
    DuplicatePrompt { name: String },

    /// A tool call reported `isError` on the wire
    #[error("{message}")]
    ToolFailed { kind: ErrorKind, message: String },

    /// A JSON-RPC error object returned by the server
    #[error("{message} (code {code})")]
    Rpc { code: i32, message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },
}

impl McpError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            McpError::ToolNotFound { .. }
            | McpError::ResourceNotFound { .. }
            | McpError::PromptNotFound { .. } => ErrorKind::NotFound,
            McpError::MissingParameter { .. }
            | McpError::InvalidParameter { .. }
            | McpError::InvalidArguments { .. } => ErrorKind::Validation,
            McpError::ToolFailed { kind, .. } => *kind,
            McpError::Rpc { code, .. } => match *code {
                crate::mcp::types::error_codes::METHOD_NOT_FOUND
                | crate::mcp::types::error_codes::NOT_FOUND => ErrorKind::NotFound,
                crate::mcp::types::error_codes::INVALID_PARAMS => ErrorKind::Validation,
                _ => ErrorKind::Internal,
            },
            McpError::DuplicateTool { .. }
            | McpError::DuplicateResource { .. }
            | McpError::DuplicatePrompt { .. }
            | McpError::Protocol { .. } => ErrorKind::Internal,
        }
    }
}

/// Client transport errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("cannot reach MCP server at {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    BadStatus { url: String, status: u16 },
}

/// LLM (upstream) errors
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("LLM request failed: {message}")]
    Request { message: String },

    #[error("LLM returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM response could not be parsed: {message}")]
    Unparseable { message: String },

    #[error("no tool could be selected for: {instruction}")]
    NoSelection { instruction: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}

/// Server process errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("port {port} is already in use {}", port_holder(.mcp_server_running))]
    PortInUse { port: u16, mcp_server_running: bool },

    #[error("server did not become healthy at {url}")]
    NotHealthy { url: String },

    #[error("server is not running")]
    NotRunning,

    #[error("cannot start a server for {url}: not a local address")]
    NotLocal { url: String },
}

fn port_holder(mcp_server_running: &bool) -> &'static str {
    if *mcp_server_running {
        "by a running MCP demo server"
    } else {
        "by another process"
    }
}

impl DemoError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DemoError::Mcp(e) => e.kind(),
            DemoError::Connection(_) | DemoError::Http(_) => ErrorKind::Connection,
            DemoError::Upstream(_) => ErrorKind::Upstream,
            DemoError::Config(_)
            | DemoError::Server(_)
            | DemoError::Io(_)
            | DemoError::Json(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias for demo operations
pub type Result<T> = std::result::Result<T, DemoError>;

/// Result type alias for registry operations
pub type McpResult<T> = std::result::Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = McpError::MissingParameter {
            name: "b".to_string(),
        };
        assert_eq!(err.to_string(), "missing required parameter: b");

        let err = McpError::ToolNotFound {
            name: "subtract".to_string(),
        };
        assert_eq!(err.to_string(), "tool not found: subtract");
    }

    #[test]
    fn test_error_conversion() {
        let mcp_err = McpError::PromptNotFound {
            name: "nope".to_string(),
        };
        let demo_err: DemoError = mcp_err.into();
        assert!(matches!(demo_err, DemoError::Mcp(_)));
        assert_eq!(demo_err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_rpc_error_kind() {
        let err = McpError::Rpc {
            code: -32602,
            message: "missing required parameter: city".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = McpError::Rpc {
            code: -32603,
            message: "boom".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_port_in_use_display() {
        let err = ServerError::PortInUse {
            port: 8765,
            mcp_server_running: true,
        };
        assert!(err.to_string().contains("running MCP demo server"));
    }
}
