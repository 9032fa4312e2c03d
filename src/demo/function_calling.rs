//! Traditional function calling
//!
//! The functions live in this process and their schemas are handed to the
//! model directly. No server, no discovery.

use std::sync::Arc;

use crate::catalog;
use crate::config::Config;
use crate::demo::{heading, pretty, print_outcome};
use crate::error::{DemoError, Result};
use crate::llm::bridge::{BridgeOutcome, LlmBridge, LocalBackend};
use crate::llm::groq::GroqClient;

pub const REQUESTS: &[&str] = &[
    "What's the weather in New York?",
    "Add 10 and 15",
    "Get user 3's information",
];

/// Build the local registry and run every request
pub async fn run_local(config: &Config) -> Result<()> {
    heading("FUNCTION CALLING DEMO");
    let registry = Arc::new(catalog::tool_registry()?);
    let bridge = LlmBridge::new(LocalBackend::new(registry), GroqClient::from_config(config)?);
    run(&bridge).await.map(|_| ())
}

/// Print the schemas, then run [`REQUESTS`]
pub async fn run(bridge: &LlmBridge<LocalBackend>) -> Result<Vec<BridgeOutcome>> {
    let schemas = bridge.backend().function_schemas();
    println!("Function schemas sent to the model:");
    for schema in &schemas {
        println!("  - {}", schema["function"]["name"].as_str().unwrap_or_default());
    }
    if let Some(example) = schemas.first() {
        println!("\nExample schema:\n{}", pretty(example));
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
                outcomes.push(outcome);
            }
            Err(e) => {
                println!("Error: {}", e);
                failure.get_or_insert(e);
            }
        }
    }

    println!("\nEvery function and its schema had to be wired into this program by hand.");
    match failure {
        Some(e) => Err(e),
        None => Ok(outcomes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_requests_offline() {
        let registry = Arc::new(catalog::tool_registry().unwrap());
        let bridge = LlmBridge::offline(LocalBackend::new(registry));

        let outcomes = run(&bridge).await.unwrap();
        assert_eq!(outcomes[0].result["temperature"], 22);
        assert_eq!(outcomes[1].choice.name, "add");
        assert_eq!(outcomes[1].result, json!(25));
        assert_eq!(outcomes[2].result["name"], "Charlie");
    }
}
