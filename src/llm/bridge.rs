//! LLM-driven tool selection and execution
//!
//! The bridge asks a language model which tool fits an instruction, then runs
//! that tool through a [`ToolBackend`]. Two backends exist: [`McpBackend`]
//! reaches tools over MCP and asks the model for a JSON answer in the prompt,
//! [`LocalBackend`] calls an in-process registry and uses the provider's
//! structured function calling.
//!
//! Without a credential, or when the model fails or answers with something
//! unusable, selection falls back to [`simulate_choice`]. Failures of the tool
//! itself are returned as they are.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DemoError, Result, UpstreamError};
use crate::llm::groq::GroqClient;
use crate::llm::simulate::simulate_choice;
use crate::mcp::client::McpClient;
use crate::mcp::registry::{ToolDescriptor, ToolRegistry};

/// Tool name plus arguments, as selected for an instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolChoice {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// How the model is asked to pick a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStyle {
    /// Tool list in the prompt, JSON object in the reply
    PromptJson,
    /// Provider `tools` + `tool_choice: auto`
    FunctionCalling,
}

/// Where a choice came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceSource {
    Llm,
    Simulated,
}

impl std::fmt::Display for ChoiceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChoiceSource::Llm => write!(f, "llm"),
            ChoiceSource::Simulated => write!(f, "simulated"),
        }
    }
}

/// Result of [`LlmBridge::run`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeOutcome {
    pub choice: ToolChoice,
    pub source: ChoiceSource,
    pub result: Value,
}

/// Where tools come from and how they run
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Short name for narration and logs
    fn label(&self) -> &'static str;

    fn style(&self) -> SelectionStyle;

    /// Tools the model may choose from
    async fn descriptors(&self) -> Result<Vec<ToolDescriptor>>;

    /// Run the chosen tool
    async fn execute(&self, choice: &ToolChoice) -> Result<Value>;
}

/// Tools discovered from an MCP server
pub struct McpBackend {
    client: McpClient,
}

impl McpBackend {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &McpClient {
        &self.client
    }

    /// Give the session back, e.g. to disconnect it
    pub fn into_client(self) -> McpClient {
        self.client
    }
}

#[async_trait]
impl ToolBackend for McpBackend {
    fn label(&self) -> &'static str {
        "mcp"
    }

    fn style(&self) -> SelectionStyle {
        SelectionStyle::PromptJson
    }

    async fn descriptors(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(self
            .client
            .tools()
            .iter()
            .map(ToolDescriptor::from_tool)
            .collect())
    }

    async fn execute(&self, choice: &ToolChoice) -> Result<Value> {
        self.client
            .invoke(&choice.name, Value::Object(choice.arguments.clone()))
            .await
    }
}

/// Functions registered in this process
pub struct LocalBackend {
    registry: Arc<ToolRegistry>,
}

impl LocalBackend {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Provider function schemas for every registered tool
    pub fn function_schemas(&self) -> Vec<Value> {
        self.registry
            .list()
            .into_iter()
            .map(ToolDescriptor::function_schema)
            .collect()
    }
}

#[async_trait]
impl ToolBackend for LocalBackend {
    fn label(&self) -> &'static str {
        "function-calling"
    }

    fn style(&self) -> SelectionStyle {
        SelectionStyle::FunctionCalling
    }

    async fn descriptors(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(self.registry.list().into_iter().cloned().collect())
    }

    async fn execute(&self, choice: &ToolChoice) -> Result<Value> {
        self.registry
            .invoke(&choice.name, Value::Object(choice.arguments.clone()))
            .map_err(DemoError::from)
    }
}

/// Select-then-execute over a backend
pub struct LlmBridge<B> {
    backend: B,
    llm: Option<GroqClient>,
}

impl<B: ToolBackend> LlmBridge<B> {
    pub fn new(backend: B, llm: Option<GroqClient>) -> Self {
        Self { backend, llm }
    }

    /// Bridge that always uses the simulated selection
    pub fn offline(backend: B) -> Self {
        Self::new(backend, None)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Pick a tool for `instruction` and run it
    pub async fn run(&self, instruction: &str) -> Result<BridgeOutcome> {
        let descriptors = self.backend.descriptors().await?;
        let (choice, source) = self.select(instruction, &descriptors).await?;

        tracing::info!(
            backend = self.backend.label(),
            tool = %choice.name,
            %source,
            "tool selected"
        );

        let result = self.backend.execute(&choice).await?;
        Ok(BridgeOutcome {
            choice,
            source,
            result,
        })
    }

    /// Ask the model to phrase an answer from the tool result
    ///
    /// `Ok(None)` without a credential.
    pub async fn explain(&self, instruction: &str, outcome: &BridgeOutcome) -> Result<Option<String>> {
        let Some(llm) = &self.llm else {
            return Ok(None);
        };

        let prompt = format!(
            "The user asked: \"{}\"\n\
             The tool {} was called with {} and returned: {}\n\n\
             Answer the user in one or two sentences using this result.",
            instruction,
            outcome.choice.name,
            Value::Object(outcome.choice.arguments.clone()),
            outcome.result,
        );
        llm.complete(&prompt).await.map(Some)
    }

    async fn select(
        &self,
        instruction: &str,
        descriptors: &[ToolDescriptor],
    ) -> Result<(ToolChoice, ChoiceSource)> {
        if let Some(llm) = &self.llm {
            match self.ask_llm(llm, instruction, descriptors).await {
                Ok(Some(choice)) if descriptors.iter().any(|d| d.name == choice.name) => {
                    return Ok((choice, ChoiceSource::Llm));
                }
                Ok(Some(choice)) => {
                    tracing::warn!(tool = %choice.name, "LLM chose an unknown tool; falling back to simulation");
                }
                Ok(None) => {
                    tracing::warn!("LLM did not choose a tool; falling back to simulation");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "LLM selection failed; falling back to simulation");
                }
            }
        }

        simulate_choice(instruction, descriptors)
            .map(|choice| (choice, ChoiceSource::Simulated))
            .ok_or_else(|| {
                UpstreamError::NoSelection {
                    instruction: instruction.to_string(),
                }
                .into()
            })
    }

    async fn ask_llm(
        &self,
        llm: &GroqClient,
        instruction: &str,
        descriptors: &[ToolDescriptor],
    ) -> Result<Option<ToolChoice>> {
        match self.backend.style() {
            SelectionStyle::PromptJson => {
                let reply = llm.complete(&selection_prompt(instruction, descriptors)).await?;
                tracing::debug!(reply = %reply, "LLM selection reply");
                Ok(parse_selection(&reply))
            }
            SelectionStyle::FunctionCalling => {
                let functions: Vec<Value> =
                    descriptors.iter().map(ToolDescriptor::function_schema).collect();
                let call = llm.call_function(instruction, &functions).await?;
                Ok(call.map(|call| ToolChoice {
                    name: call.name,
                    arguments: call.arguments,
                }))
            }
        }
    }
}

/// Prompt asking for a `{"tool_name", "parameters"}` object
pub fn selection_prompt(instruction: &str, descriptors: &[ToolDescriptor]) -> String {
    let tools = descriptors
        .iter()
        .map(|d| format!("- {}", d.summary()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an AI assistant that can call tools to help users.\n\
         Available tools:\n{}\n\n\
         User query: \"{}\"\n\n\
         Based on the user query, determine which tool to use and what parameters to provide.\n\
         Respond with ONLY a JSON object in this format:\n\
         {{\"tool_name\": \"tool_name_here\", \"parameters\": {{\"param1\": \"value1\"}}}}\n\n\
         Do not include any other text in your response.",
        tools, instruction
    )
}

/// Pull a tool choice out of a model reply
///
/// Tolerates code fences and prose around the object, and the
/// `function_name` / `arguments` spellings.
pub fn parse_selection(reply: &str) -> Option<ToolChoice> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }

    let value: Value = serde_json::from_str(&reply[start..=end]).ok()?;
    let name = value
        .get("tool_name")
        .or_else(|| value.get("function_name"))
        .or_else(|| value.get("name"))
        .and_then(Value::as_str)?
        .trim();
    if name.is_empty() {
        return None;
    }

    let arguments = match value.get("parameters").or_else(|| value.get("arguments")) {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    Some(ToolChoice {
        name: name.to_string(),
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn local_bridge() -> LlmBridge<LocalBackend> {
        let registry = Arc::new(catalog::tool_registry().unwrap());
        LlmBridge::offline(LocalBackend::new(registry))
    }

    async fn mcp_bridge() -> LlmBridge<McpBackend> {
        let server = Arc::new(catalog::demo_server().unwrap());
        let client = McpClient::connect_in_process(server).await.unwrap();
        LlmBridge::offline(McpBackend::new(client))
    }

    #[tokio::test]
    async fn test_offline_multiply() {
        let outcome = local_bridge().run("what is 4 times 5").await.unwrap();
        assert_eq!(outcome.choice.name, "multiply");
        assert_eq!(outcome.source, ChoiceSource::Simulated);
        assert_eq!(outcome.result, json!(20));
    }

    #[tokio::test]
    async fn test_offline_mcp_divide() {
        let outcome = mcp_bridge().await.run("Calculate 25 divided by 5").await.unwrap();
        assert_eq!(outcome.choice.name, "calculate");
        assert_eq!(outcome.result["result"], json!(5));
    }

    #[tokio::test]
    async fn test_both_backends_agree() {
        let local = local_bridge().run("What's the weather like in Tokyo?").await.unwrap();
        let remote = mcp_bridge()
            .await
            .run("What's the weather like in Tokyo?")
            .await
            .unwrap();
        assert_eq!(local.choice, remote.choice);
        assert_eq!(local.result, remote.result);
    }

    #[tokio::test]
    async fn test_no_selection() {
        let err = local_bridge().run("sing me a song").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[tokio::test]
    async fn test_explain_without_llm() {
        let bridge = local_bridge();
        let outcome = bridge.run("Add 10 and 15").await.unwrap();
        assert!(bridge.explain("Add 10 and 15", &outcome).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_descriptors_in_registration_order() {
        let names: Vec<String> = local_bridge()
            .backend()
            .descriptors()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            names,
            ["get_weather", "calculate", "get_user_info", "add", "multiply"]
        );
    }

    #[test]
    fn test_parse_selection_plain() {
        let choice =
            parse_selection(r#"{"tool_name": "get_weather", "parameters": {"city": "Tokyo"}}"#)
                .unwrap();
        assert_eq!(choice.name, "get_weather");
        assert_eq!(choice.arguments["city"], "Tokyo");
    }

    #[test]
    fn test_parse_selection_fenced() {
        let reply = "Sure!\n```json\n{\"function_name\": \"add\", \"arguments\": {\"a\": 1, \"b\": 2}}\n```";
        let choice = parse_selection(reply).unwrap();
        assert_eq!(choice.name, "add");
        assert_eq!(choice.arguments["b"], 2);
    }

    #[test]
    fn test_parse_selection_rejects_garbage() {
        assert!(parse_selection("I don't know").is_none());
        assert!(parse_selection("{not json}").is_none());
        assert!(parse_selection(r#"{"parameters": {}}"#).is_none());
    }

    #[test]
    fn test_selection_prompt_lists_tools() {
        let registry = catalog::tool_registry().unwrap();
        let descriptors: Vec<ToolDescriptor> = registry.list().into_iter().cloned().collect();
        let prompt = selection_prompt("Add 1 and 2", &descriptors);
        assert!(prompt.contains("- add: "));
        assert!(prompt.contains("\"tool_name\""));
        assert!(prompt.contains("User query: \"Add 1 and 2\""));
    }
}
