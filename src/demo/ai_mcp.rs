//! LLM + MCP client
//!
//! Tools are discovered from the server at runtime and the model picks one per
//! request; the call itself goes over MCP.

use crate::config::Config;
use crate::demo::{heading, print_outcome};
use crate::error::{DemoError, Result};
use crate::llm::bridge::{BridgeOutcome, LlmBridge, McpBackend};
use crate::llm::groq::GroqClient;
use crate::mcp::client::McpClient;
use crate::mcp::registry::ToolDescriptor;

pub const REQUESTS: &[&str] = &[
    "What's the weather like in Tokyo?",
    "Calculate 25 divided by 5",
    "Get information for user ID 2",
];

/// Connect over HTTP and run every request
pub async fn run_http(config: &Config) -> Result<()> {
    heading("AI + MCP CLIENT DEMO");
    let client = McpClient::connect_http(&config.mcp_url(), config.request_timeout).await?;
    let bridge = LlmBridge::new(McpBackend::new(client), GroqClient::from_config(config)?);

    let outcome = run(&bridge).await;
    bridge.into_backend().into_client().disconnect();
    outcome.map(|_| ())
}

/// Run [`REQUESTS`]; fails with the first error after trying all of them
pub async fn run(bridge: &LlmBridge<McpBackend>) -> Result<Vec<BridgeOutcome>> {
    let tools = bridge.backend().client().tools();
    println!("Discovered {} tools via MCP:", tools.len());
    for tool in tools {
        println!("  - {}", ToolDescriptor::from_tool(tool).summary());
    }

    if !bridge.has_llm() {
        println!("\nNo Groq API key configured - simulating LLM responses");
    }

    let mut outcomes = Vec::new();
    let mut failure: Option<DemoError> = None;
    for request in REQUESTS {
        println!("\nUser: {}", request);
        match bridge.run(request).await {
            Ok(outcome) => {
                print_outcome(&outcome);
                match bridge.explain(request, &outcome).await {
                    Ok(Some(answer)) => println!("   Answer: {}", answer),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, %request, "LLM explanation failed");
                        println!("   (no explanation: {})", e);
                    }
                }
                outcomes.push(outcome);
            }
            Err(e) => {
                println!("Error: {}", e);
                failure.get_or_insert(e);
            }
        }
    }

    println!("\nThe same tools were discovered over MCP; the model only chose among them.");
    match failure {
        Some(e) => Err(e),
        None => Ok(outcomes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_requests_offline() {
        let server = Arc::new(catalog::demo_server().unwrap());
        let client = McpClient::connect_in_process(server).await.unwrap();
        let bridge = LlmBridge::offline(McpBackend::new(client));

        let outcomes = run(&bridge).await.unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].result["condition"], "rainy");
        assert_eq!(outcomes[1].result["result"], json!(5));
        assert_eq!(outcomes[2].result["name"], "Bob");
    }

    #[tokio::test]
    async fn test_failed_explanation_keeps_outcomes() {
        use axum::http::StatusCode;
        use axum::routing::post;

        // Every completion is rejected: selection falls back, explanation fails
        let app = axum::Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
        );
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = format!("http://127.0.0.1:{}/v1", port);
        let config = Config::from_lookup(|var| match var {
            "GROQ_API_KEY" => Some("gsk_test".to_string()),
            "GROQ_BASE_URL" => Some(base_url.clone()),
            _ => None,
        })
        .unwrap();

        let server = Arc::new(catalog::demo_server().unwrap());
        let client = McpClient::connect_in_process(server).await.unwrap();
        let bridge = LlmBridge::new(
            McpBackend::new(client),
            GroqClient::from_config(&config).unwrap(),
        );
        assert!(bridge.has_llm());

        let outcomes = run(&bridge).await.unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[1].result["result"], json!(5));
    }
}
