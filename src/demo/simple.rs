//! Plain MCP client: no model involved
//!
//! Any program can discover and call tools, read resources and render prompts
//! over MCP. This flow walks through all of it against a running server.

use serde_json::{json, Map, Value};

use crate::config::Config;
use crate::demo::{heading, preview, pretty};
use crate::error::Result;
use crate::mcp::client::McpClient;

/// Calls made by the demo, in order
pub const TOOL_CALLS: &[(&str, &str)] = &[
    ("get_weather", r#"{"city": "London"}"#),
    ("calculate", r#"{"operation": "multiply", "a": 15, "b": 4}"#),
    ("get_user_info", r#"{"user_id": 1}"#),
];

const PREVIEW_CHARS: usize = 200;

/// Connect over HTTP, run the walkthrough, disconnect
pub async fn run_http(config: &Config) -> Result<()> {
    heading("SIMPLE MCP CLIENT DEMO (Non-AI Application)");
    println!("Connecting to {}", config.mcp_url());

    let client = McpClient::connect_http(&config.mcp_url(), config.request_timeout).await?;
    let outcome = run(&client).await;
    client.disconnect();
    outcome
}

/// Walk through every MCP feature on a connected client
pub async fn run(client: &McpClient) -> Result<()> {
    heading("SERVER CONNECTIVITY");
    client.ping().await?;
    let info = client.server_info();
    println!("Server ping successful: {} {}", info.name, info.version);

    heading("DISCOVERY");
    let tools = client.list_tools().await?;
    println!("\nFound {} tools:", tools.len());
    for tool in &tools {
        println!("  - {}: {}", tool.name, tool.description.as_deref().unwrap_or(""));
    }

    let resources = client.list_resources().await?;
    println!("\nFound {} resources:", resources.len());
    for resource in &resources {
        println!("  - {}: {}", resource.uri, resource.name);
        if let Some(description) = &resource.description {
            println!("    Description: {}", description);
        }
    }

    let prompts = client.list_prompts().await?;
    println!("\nFound {} prompts:", prompts.len());
    for prompt in &prompts {
        println!("  - {}: {}", prompt.name, prompt.description.as_deref().unwrap_or(""));
        if !prompt.arguments.is_empty() {
            let names: Vec<&str> = prompt.arguments.iter().map(|a| a.name.as_str()).collect();
            println!("    Parameters: {}", names.join(", "));
        }
    }

    heading("MCP TOOL SCHEMAS");
    for tool in &tools {
        println!("\nTool: {}", tool.name);
        println!("{}", pretty(&tool.input_schema));
    }

    heading("EXECUTING MCP TOOLS");
    for (name, arguments) in TOOL_CALLS {
        let arguments: Value = serde_json::from_str(arguments)?;
        println!("\nCalling {} with {}", name, arguments);
        let result = client.invoke(name, arguments).await?;
        println!("Result: {}", result);
    }

    heading("READING MCP RESOURCES");
    for resource in &resources {
        let content = client.read_resource(&resource.uri).await?;
        println!("\nResource: {}", content.uri);
        println!("Content preview: {}", preview(&content.text, PREVIEW_CHARS));
    }

    heading("GENERATING FROM PROMPT TEMPLATES");
    for prompt in &prompts {
        let arguments: Map<String, Value> = prompt
            .arguments
            .iter()
            .map(|a| (a.name.clone(), json!(sample_argument(&a.name))))
            .collect();
        let rendered = client.get_prompt(&prompt.name, arguments).await?;
        println!("\nPrompt: {}", prompt.name);
        println!("Generated content: {}", rendered.text().unwrap_or("[No content]"));
    }

    heading("MCP DEMO COMPLETED");
    println!("Discovery, tool execution, resources and prompts, all without AI.");
    Ok(())
}

fn sample_argument(name: &str) -> &'static str {
    match name {
        "name" => "MCP User",
        "tool_name" => "get_weather",
        "city" => "London",
        _ => "example",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_walkthrough_in_process() {
        let server = Arc::new(catalog::demo_server().unwrap());
        let client = McpClient::connect_in_process(server).await.unwrap();
        run(&client).await.unwrap();
        client.disconnect();
    }

    #[test]
    fn test_tool_calls_are_valid_json() {
        for (_, arguments) in TOOL_CALLS {
            let value: Value = serde_json::from_str(arguments).unwrap();
            assert!(value.is_object());
        }
    }
}
