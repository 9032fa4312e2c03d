//! Groq chat completions client
//!
//! Groq serves the OpenAI Chat Completions API, so this client speaks that
//! format: plain completions for prompt-based selection and `tools` /
//! `tool_calls` for structured function calling.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::{Result, UpstreamError};

/// A function the model asked to call
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// Chat completions client
#[derive(Clone)]
pub struct GroqClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GroqClient {
    /// Build a client from the configuration; `None` without a credential
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(api_key) = config.llm.api_key.clone() else {
            return Ok(None);
        };

        Ok(Some(Self {
            http_client: reqwest::Client::builder()
                .timeout(config.request_timeout)
                .build()?,
            api_key,
            model: config.llm.model.clone(),
            base_url: config.llm.base_url.trim_end_matches('/').to_string(),
            temperature: config.llm.temperature,
        }))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single-turn completion, returning the assistant text
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let message = self.chat(prompt, None).await?;
        message
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                UpstreamError::Unparseable {
                    message: "empty completion".to_string(),
                }
                .into()
            })
    }

    /// Ask the model to pick one of `functions` (provider function schemas)
    ///
    /// `Ok(None)` when the model answered without calling anything.
    pub async fn call_function(&self, prompt: &str, functions: &[Value]) -> Result<Option<FunctionCall>> {
        let message = self.chat(prompt, Some(functions)).await?;

        let Some(call) = message.tool_calls.unwrap_or_default().into_iter().next() else {
            return Ok(None);
        };

        let arguments = match serde_json::from_str::<Value>(&call.function.arguments) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(other) => {
                return Err(UpstreamError::Unparseable {
                    message: format!("function arguments are not an object: {}", other),
                }
                .into())
            }
            Err(e) => {
                return Err(UpstreamError::Unparseable {
                    message: e.to_string(),
                }
                .into())
            }
        };

        Ok(Some(FunctionCall {
            name: call.function.name,
            arguments,
        }))
    }

    async fn chat(&self, prompt: &str, tools: Option<&[Value]>) -> Result<ApiResponseMessage> {
        let messages = [ApiMessage {
            role: "user",
            content: prompt,
        }];
        let request = ApiChatRequest {
            model: &self.model,
            messages: &messages,
            temperature: self.temperature,
            tool_choice: tools.map(|_| "auto"),
            tools,
        };

        tracing::debug!(model = %self.model, tools = tools.map_or(0, |t| t.len()), "LLM request");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| UpstreamError::Request {
                message: e.to_string(),
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| UpstreamError::Request {
            message: format!("failed to read response body: {}", e),
        })?;

        tracing::debug!(status = %status, body_len = bytes.len(), "LLM response");

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            tracing::warn!(status = %status, "LLM request rejected");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        parse_response(&bytes)
    }
}

fn parse_response(bytes: &[u8]) -> Result<ApiResponseMessage> {
    let response: ApiChatResponse =
        serde_json::from_slice(bytes).map_err(|e| UpstreamError::Unparseable {
            message: e.to_string(),
        })?;

    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| {
            UpstreamError::Unparseable {
                message: "no choices in response".to_string(),
            }
            .into()
        })
}

#[derive(Serialize)]
struct ApiChatRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage<'a>],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Value]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a str>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiChatResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ApiResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseToolCall {
    function: ApiResponseFunctionCall,
}

#[derive(Debug, Deserialize)]
struct ApiResponseFunctionCall {
    name: String,
    arguments: String,
}
