//! Demo resources and prompt templates

use serde_json::json;

use crate::catalog::tools::{KNOWN_CITIES, OPERATIONS};
use crate::catalog::SERVER_NAME;
use crate::error::McpResult;
use crate::mcp::content::{
    FillRule, PromptArgument, PromptRegistry, PromptTemplate, ResourceDescriptor, ResourceRegistry,
};

const WELCOME: &str = "# Welcome to MCP Demo Server

This is a simple demonstration server showing:
- Tool discovery and execution
- Resource access
- Prompt templates

Available tools: get_weather, calculate, get_user_info, add, multiply";

pub fn register_resources(registry: &mut ResourceRegistry) -> McpResult<()> {
    registry.register(
        ResourceDescriptor::text(
            "demo://docs/welcome",
            "welcome_doc",
            "Welcome documentation for the demo server.",
            WELCOME,
        )
        .with_mime_type("text/markdown"),
    )?;

    registry.register(ResourceDescriptor::json(
        "demo://config/server",
        "server_config",
        "Server configuration information.",
        || {
            json!({
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
                "tools_count": 5,
                "resources_count": 3,
                "prompts_count": 3,
                "supported_transports": ["http", "stdio"],
            })
        },
    ))?;

    registry.register(ResourceDescriptor::json(
        "demo://data/sample",
        "sample_data",
        "Sample data for demonstration.",
        || {
            json!({
                "users": ["Alice", "Bob", "Charlie"],
                "cities": KNOWN_CITIES,
                "operations": OPERATIONS,
                "timestamp": "2025-09-19T12:00:00Z",
            })
        },
    ))?;

    Ok(())
}

pub fn register_prompts(registry: &mut PromptRegistry) -> McpResult<()> {
    registry.register(PromptTemplate::new(
        "greeting",
        "Generate a personalized greeting.",
        vec![PromptArgument::with_default("name", "Name to greet", "User")],
        FillRule::Template(
            "Hello {name}! Welcome to the MCP Demo Server. How can I help you today?".to_string(),
        ),
    ))?;

    let help = |tool: &str, text: &str| (tool.to_string(), text.to_string());
    registry.register(PromptTemplate::new(
        "tool_help",
        "Provide help information for tools.",
        vec![PromptArgument::with_default("tool_name", "Tool to explain", "all")],
        FillRule::Lookup {
            key: "tool_name".to_string(),
            table: vec![
                help("get_weather", "Use get_weather(city) to get weather info for New York, London, or Tokyo"),
                help("calculate", "Use calculate(operation, a, b) with operations: add, subtract, multiply, divide"),
                help("get_user_info", "Use get_user_info(user_id) with IDs 1, 2, or 3 to get user details"),
                help("add", "Use add(a, b) to add two numbers"),
                help("multiply", "Use multiply(a, b) to multiply two numbers"),
                help("all", "Available tools: get_weather, calculate, get_user_info, add, multiply. Each tool has specific parameters."),
            ],
            fallback: "No help available for tool: {tool_name}".to_string(),
        },
    ))?;

    registry.register(PromptTemplate::new(
        "weather_brief",
        "Ask for a short travel-oriented weather summary.",
        vec![PromptArgument::required("city", "City to summarize")],
        FillRule::Template(
            "Summarize today's weather in {city} for a traveller in two sentences.".to_string(),
        ),
    ))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    #[test]
    fn test_resources_registered() {
        let mut registry = ResourceRegistry::new();
        register_resources(&mut registry).unwrap();
        assert_eq!(registry.len(), 3);

        let config = registry.read("demo://config/server").unwrap();
        let parsed: Value = serde_json::from_str(&config.text).unwrap();
        assert_eq!(parsed["name"], "DemoMCPServer");
        assert_eq!(config.mime_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_tool_help_prompt() {
        let mut registry = PromptRegistry::new();
        register_prompts(&mut registry).unwrap();

        let mut params = Map::new();
        params.insert("tool_name".to_string(), Value::from("get_weather"));
        let text = registry.render("tool_help", &params).unwrap();
        assert!(text.starts_with("Use get_weather(city)"));

        params.insert("tool_name".to_string(), Value::from("teleport"));
        let text = registry.render("tool_help", &params).unwrap();
        assert_eq!(text, "No help available for tool: teleport");
    }

    #[test]
    fn test_weather_brief_requires_city() {
        let mut registry = PromptRegistry::new();
        register_prompts(&mut registry).unwrap();
        assert!(registry.render("weather_brief", &Map::new()).is_err());
    }
}
