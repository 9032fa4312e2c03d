//! The demo server's tools, resources and prompts

pub mod content;
pub mod tools;

use crate::error::McpResult;
use crate::mcp::content::{PromptRegistry, ResourceRegistry};
use crate::mcp::registry::ToolRegistry;
use crate::mcp::server::McpServer;

/// Name the demo server reports
pub const SERVER_NAME: &str = "DemoMCPServer";

/// Tool registry with every demo tool
pub fn tool_registry() -> McpResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    tools::register_all(&mut registry)?;
    Ok(registry)
}

/// Fully populated demo server
pub fn demo_server() -> McpResult<McpServer> {
    let mut resources = ResourceRegistry::new();
    content::register_resources(&mut resources)?;

    let mut prompts = PromptRegistry::new();
    content::register_prompts(&mut prompts)?;

    Ok(McpServer::new(SERVER_NAME, tool_registry()?, resources, prompts))
}
