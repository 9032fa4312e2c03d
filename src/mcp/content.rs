//! Resource and prompt registries
//!
//! Key-based lookups over content fixed at startup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{McpError, McpResult};
use crate::mcp::types::{Prompt, PromptArgumentInfo, Resource, ResourceContent};

/// Produces resource text on demand
pub type ContentFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Where a resource's text comes from
#[derive(Clone)]
pub enum ResourceSource {
    Text(String),
    Generated(ContentFn),
}

impl fmt::Debug for ResourceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceSource::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            ResourceSource::Generated(_) => f.write_str("Generated"),
        }
    }
}

/// A resource exposed by URI
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
    pub source: ResourceSource,
}

impl ResourceDescriptor {
    pub fn text(uri: &str, name: &str, description: &str, text: impl Into<String>) -> Self {
        Self {
            uri: uri.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            mime_type: "text/plain".to_string(),
            source: ResourceSource::Text(text.into()),
        }
    }

    /// JSON resource rendered from a generator each time it is read
    pub fn json<F>(uri: &str, name: &str, description: &str, generate: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self {
            uri: uri.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            mime_type: "application/json".to_string(),
            source: ResourceSource::Generated(Arc::new(move || {
                serde_json::to_string_pretty(&generate()).unwrap_or_default()
            })),
        }
    }

    pub fn with_mime_type(mut self, mime_type: &str) -> Self {
        self.mime_type = mime_type.to_string();
        self
    }

    pub fn to_resource(&self) -> Resource {
        Resource {
            uri: self.uri.clone(),
            name: self.name.clone(),
            description: Some(self.description.clone()),
            mime_type: Some(self.mime_type.clone()),
        }
    }

    fn content(&self) -> ResourceContent {
        let text = match &self.source {
            ResourceSource::Text(text) => text.clone(),
            ResourceSource::Generated(generate) => generate(),
        };
        ResourceContent {
            uri: self.uri.clone(),
            mime_type: Some(self.mime_type.clone()),
            text,
        }
    }
}

/// Resources keyed by URI, listed in registration order
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: Vec<ResourceDescriptor>,
    index: HashMap<String, usize>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, resource: ResourceDescriptor) -> McpResult<()> {
        if self.index.contains_key(&resource.uri) {
            return Err(McpError::DuplicateResource { uri: resource.uri });
        }
        self.index.insert(resource.uri.clone(), self.resources.len());
        self.resources.push(resource);
        Ok(())
    }

    pub fn list(&self) -> Vec<Resource> {
        self.resources.iter().map(|r| r.to_resource()).collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Content of the resource at `uri`
    pub fn read(&self, uri: &str) -> McpResult<ResourceContent> {
        self.index
            .get(uri)
            .map(|&i| self.resources[i].content())
            .ok_or_else(|| McpError::ResourceNotFound {
                uri: uri.to_string(),
            })
    }
}

/// A prompt parameter
#[derive(Debug, Clone, PartialEq)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub default: Option<String>,
}

impl PromptArgument {
    pub fn required(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: true,
            default: None,
        }
    }

    pub fn with_default(name: &str, description: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: false,
            default: Some(default.to_string()),
        }
    }
}

/// How the parameters turn into text
#[derive(Debug, Clone, PartialEq)]
pub enum FillRule {
    /// Text with `{argument}` placeholders
    Template(String),

    /// Pick an entry by the value of `key`, or fill `fallback`
    Lookup {
        key: String,
        table: Vec<(String, String)>,
        fallback: String,
    },
}

/// A named, parameterized prompt
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
    pub rule: FillRule,
}

impl PromptTemplate {
    pub fn new(name: &str, description: &str, arguments: Vec<PromptArgument>, rule: FillRule) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            arguments,
            rule,
        }
    }

    pub fn to_prompt(&self) -> Prompt {
        Prompt {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            arguments: self
                .arguments
                .iter()
                .map(|a| PromptArgumentInfo {
                    name: a.name.clone(),
                    description: Some(a.description.clone()),
                    required: a.required,
                })
                .collect(),
        }
    }

    /// Fill the template from `params`
    pub fn render(&self, params: &Map<String, Value>) -> McpResult<String> {
        let mut values: HashMap<&str, String> = HashMap::new();
        for arg in &self.arguments {
            let value = match params.get(&arg.name) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            };
            match value.or_else(|| arg.default.clone()) {
                Some(v) => {
                    values.insert(arg.name.as_str(), v);
                }
                None => {
                    return Err(McpError::MissingParameter {
                        name: arg.name.clone(),
                    })
                }
            }
        }

        let text = match &self.rule {
            FillRule::Template(template) => fill(template, &values),
            FillRule::Lookup {
                key,
                table,
                fallback,
            } => {
                let selected = values.get(key.as_str()).map(String::as_str).unwrap_or("");
                table
                    .iter()
                    .find(|(k, _)| k == selected)
                    .map(|(_, text)| fill(text, &values))
                    .unwrap_or_else(|| fill(fallback, &values))
            }
        };
        Ok(text)
    }
}

fn fill(template: &str, values: &HashMap<&str, String>) -> String {
    values.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}

/// Prompts keyed by name, listed in registration order
#[derive(Debug, Default)]
pub struct PromptRegistry {
    prompts: Vec<PromptTemplate>,
    index: HashMap<String, usize>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, prompt: PromptTemplate) -> McpResult<()> {
        if self.index.contains_key(&prompt.name) {
            return Err(McpError::DuplicatePrompt { name: prompt.name });
        }
        self.index.insert(prompt.name.clone(), self.prompts.len());
        self.prompts.push(prompt);
        Ok(())
    }

    pub fn list(&self) -> Vec<Prompt> {
        self.prompts.iter().map(|p| p.to_prompt()).collect()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.index.get(name).map(|&i| &self.prompts[i])
    }

    /// Render the named prompt
    pub fn render(&self, name: &str, params: &Map<String, Value>) -> McpResult<String> {
        self.get(name)
            .ok_or_else(|| McpError::PromptNotFound {
                name: name.to_string(),
            })?
            .render(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_read_known_resource() {
        let mut registry = ResourceRegistry::new();
        registry
            .register(ResourceDescriptor::text("demo://a", "a", "A", "hello"))
            .unwrap();
        let content = registry.read("demo://a").unwrap();
        assert_eq!(content.text, "hello");
        assert_eq!(content.mime_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_read_is_idempotent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut registry = ResourceRegistry::new();
        registry
            .register(ResourceDescriptor::json("demo://cfg", "cfg", "Config", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                json!({"name": "DemoMCPServer"})
            }))
            .unwrap();

        let first = registry.read("demo://cfg").unwrap();
        let second = registry.read("demo://cfg").unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_resource() {
        let registry = ResourceRegistry::new();
        let err = registry.read("demo://missing").unwrap_err();
        assert_eq!(err.to_string(), "resource not found: demo://missing");
    }

    #[test]
    fn test_duplicate_resource() {
        let mut registry = ResourceRegistry::new();
        registry
            .register(ResourceDescriptor::text("demo://a", "a", "A", "x"))
            .unwrap();
        assert!(registry
            .register(ResourceDescriptor::text("demo://a", "a", "A", "y"))
            .is_err());
    }

    #[test]
    fn test_template_with_default() {
        let prompt = PromptTemplate::new(
            "greeting",
            "Greet",
            vec![PromptArgument::with_default("name", "Who", "User")],
            FillRule::Template("Hello {name}!".to_string()),
        );
        assert_eq!(prompt.render(&Map::new()).unwrap(), "Hello User!");
        assert_eq!(
            prompt.render(&params(json!({"name": "Ada"}))).unwrap(),
            "Hello Ada!"
        );
    }

    #[test]
    fn test_missing_required_prompt_argument() {
        let mut registry = PromptRegistry::new();
        registry
            .register(PromptTemplate::new(
                "brief",
                "Brief",
                vec![PromptArgument::required("city", "City")],
                FillRule::Template("Weather in {city}".to_string()),
            ))
            .unwrap();
        let err = registry.render("brief", &Map::new()).unwrap_err();
        assert_eq!(err.to_string(), "missing required parameter: city");
    }

    #[test]
    fn test_lookup_rule_with_fallback() {
        let prompt = PromptTemplate::new(
            "help",
            "Help",
            vec![PromptArgument::with_default("tool_name", "Tool", "all")],
            FillRule::Lookup {
                key: "tool_name".to_string(),
                table: vec![("all".to_string(), "Everything".to_string())],
                fallback: "No help for {tool_name}".to_string(),
            },
        );
        assert_eq!(prompt.render(&Map::new()).unwrap(), "Everything");
        assert_eq!(
            prompt.render(&params(json!({"tool_name": "x"}))).unwrap(),
            "No help for x"
        );
    }

    #[test]
    fn test_unknown_prompt() {
        let registry = PromptRegistry::new();
        let err = registry.render("nope", &Map::new()).unwrap_err();
        assert!(matches!(err, McpError::PromptNotFound { .. }));
    }
}
