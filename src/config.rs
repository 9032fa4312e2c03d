//! Configuration management for the MCP demo
//!
//! Handles the server address, client timeouts and the LLM credential.

use std::net::IpAddr;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Placeholder the tutorial scripts ship with instead of a real key
const API_KEY_PLACEHOLDER: &str = "your-groq-api-key-here";

/// Configuration for the MCP demo
#[derive(Debug, Clone)]
pub struct Config {
    /// Host the server binds to
    pub host: String,

    /// Port the server binds to
    pub port: u16,

    /// Base URL clients use to reach the server (no trailing slash)
    pub server_url: String,

    /// Per-request timeout for MCP and LLM calls
    pub request_timeout: Duration,

    /// LLM settings
    pub llm: LlmConfig,
}

/// Settings for the OpenAI-compatible chat completions API
#[derive(Clone)]
pub struct LlmConfig {
    /// API key; `None` means simulation mode
    pub api_key: Option<String>,

    /// Model name
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Sampling temperature
    pub temperature: f32,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Config {
    /// Create a configuration from the process environment
    pub fn new() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("MCP_DEMO_HOST").unwrap_or_else(|| defaults::HOST.to_string());
        let port = parse_var(&lookup, "MCP_DEMO_PORT")?.unwrap_or(defaults::PORT);
        let server_url = lookup("MCP_DEMO_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));
        let timeout_secs =
            parse_var(&lookup, "MCP_DEMO_TIMEOUT_SECS")?.unwrap_or(defaults::TIMEOUT_SECS);

        let api_key = lookup("GROQ_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != API_KEY_PLACEHOLDER);

        Ok(Self {
            host,
            port,
            server_url,
            request_timeout: Duration::from_secs(timeout_secs),
            llm: LlmConfig {
                api_key,
                model: lookup("GROQ_MODEL").unwrap_or_else(|| defaults::MODEL.to_string()),
                base_url: lookup("GROQ_BASE_URL")
                    .unwrap_or_else(|| defaults::LLM_BASE_URL.to_string()),
                temperature: defaults::TEMPERATURE,
            },
        })
    }

    /// Point clients at a different server
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// JSON-RPC endpoint URL
    pub fn mcp_url(&self) -> String {
        format!("{}{}", self.server_url, paths::MCP)
    }

    /// Health check URL
    pub fn health_url(&self) -> String {
        format!("{}{}", self.server_url, paths::HEALTH)
    }

    /// Port `server_url` points at, when its host is this machine
    ///
    /// A server started for the clients must listen here, which is not
    /// necessarily `port` once the URL was overridden.
    pub fn local_server_port(&self) -> Option<u16> {
        let url = reqwest::Url::parse(&self.server_url).ok()?;
        let host = url.host_str()?.trim_start_matches('[').trim_end_matches(']');
        let local = host.eq_ignore_ascii_case("localhost")
            || host
                .parse::<IpAddr>()
                .map(|ip| ip.is_loopback() || ip.is_unspecified())
                .unwrap_or(false);
        if local {
            url.port_or_known_default()
        } else {
            None
        }
    }

    /// Whether an LLM credential is configured
    pub fn has_llm_credential(&self) -> bool {
        self.llm.api_key.is_some()
    }
}

fn parse_var<F, T>(lookup: &F, var: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value.trim().parse().map(Some).map_err(|_| {
            ConfigError::InvalidValue {
                var: var.to_string(),
                value,
            }
            .into()
        }),
    }
}

/// Default values
pub mod defaults {
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 8765;
    pub const TIMEOUT_SECS: u64 = 10;
    pub const MODEL: &str = "llama-3.1-8b-instant";
    pub const LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
    pub const TEMPERATURE: f32 = 0.1;
}

/// HTTP endpoint paths
pub mod paths {
    pub const MCP: &str = "/mcp";
    pub const HEALTH: &str = "/health";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8765);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.mcp_url(), "http://localhost:8765/mcp");
        assert_eq!(config.health_url(), "http://localhost:8765/health");
        assert!(!config.has_llm_credential());
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
    }

    #[test]
    fn test_placeholder_key_means_simulation() {
        let config = config_from(&[("GROQ_API_KEY", "your-groq-api-key-here")]).unwrap();
        assert!(!config.has_llm_credential());

        let config = config_from(&[("GROQ_API_KEY", "  ")]).unwrap();
        assert!(!config.has_llm_credential());

        let config = config_from(&[("GROQ_API_KEY", "gsk_real")]).unwrap();
        assert!(config.has_llm_credential());
    }

    #[test]
    fn test_port_override_moves_default_url() {
        let config = config_from(&[("MCP_DEMO_PORT", "9000")]).unwrap();
        assert_eq!(config.server_url, "http://localhost:9000");
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = config_from(&[("MCP_DEMO_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("MCP_DEMO_PORT"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = config_from(&[("GROQ_API_KEY", "gsk_secret")]).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("gsk_secret"));
    }

    #[test]
    fn test_with_server_url_trims_slash() {
        let config = config_from(&[]).unwrap().with_server_url("http://10.0.0.2:1234/");
        assert_eq!(config.mcp_url(), "http://10.0.0.2:1234/mcp");
    }

    #[test]
    fn test_local_server_port_follows_url() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.local_server_port(), Some(8765));

        let config = config.with_server_url("http://127.0.0.1:9001");
        assert_eq!(config.port, 8765);
        assert_eq!(config.local_server_port(), Some(9001));

        let config = config.with_server_url("http://[::1]:9002");
        assert_eq!(config.local_server_port(), Some(9002));

        let config = config.with_server_url("http://localhost");
        assert_eq!(config.local_server_port(), Some(80));

        let config = config.with_server_url("http://10.0.0.2:1234");
        assert_eq!(config.local_server_port(), None);

        let config = config.with_server_url("not a url");
        assert_eq!(config.local_server_port(), None);
    }
}
