//! Tool registry
//!
//! Holds the named, schema-described callables a server exposes. The
//! registry is built once at startup and only read afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::{McpError, McpResult};
use crate::mcp::types::Tool;

/// Validated tool arguments
pub type Arguments = Map<String, Value>;

/// Tool implementation
pub type ToolFn = Arc<dyn Fn(Arguments) -> McpResult<Value> + Send + Sync>;

/// Parameter type accepted by a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
}

impl ParamType {
    /// JSON Schema type name
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
        }
    }

    /// Read the type out of a JSON Schema property, skipping `"null"` in
    /// union types. Unknown types fall back to string.
    fn from_schema(property: &Value) -> Self {
        let name = match property.get("type") {
            Some(Value::String(s)) => Some(s.as_str()),
            Some(Value::Array(types)) => types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null"),
            _ => None,
        };

        match name {
            Some("number") => ParamType::Number,
            Some("integer") => ParamType::Integer,
            Some("boolean") => ParamType::Boolean,
            _ => ParamType::String,
        }
    }

    /// Coerce a JSON value to this type, if possible
    fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ParamType::String, Value::String(_)) => Some(value.clone()),
            (ParamType::Number, Value::Number(_)) => Some(value.clone()),
            (ParamType::Number, Value::String(s)) => {
                s.trim().parse::<f64>().ok().filter(|n| n.is_finite()).map(number)
            }
            (ParamType::Integer, Value::Number(n)) => {
                if n.is_i64() || n.is_u64() {
                    Some(value.clone())
                } else {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER)
                        .map(|f| json!(f as i64))
                }
            }
            (ParamType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(|i| json!(i)),
            (ParamType::Boolean, Value::Bool(_)) => Some(value.clone()),
            (ParamType::Boolean, Value::String(s)) => match s.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Largest integer an f64 represents exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Render a float as a JSON number, using an integer when it is whole
pub fn number(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        json!(value as i64)
    } else {
        json!(value)
    }
}

/// One declared tool parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub required: bool,
    pub description: String,
}

impl ParamSpec {
    pub fn required(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            description: description.to_string(),
        }
    }

    pub fn optional(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }
}

/// Name, description and parameter schema of a tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    pub fn new(name: &str, description: &str, params: Vec<ParamSpec>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            params,
        }
    }

    /// Build a descriptor from an object JSON Schema
    pub fn from_input_schema(name: &str, description: &str, schema: &Value) -> Self {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let params = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(param, property)| {
                        let kind = ParamType::from_schema(property);
                        let description = property
                            .get("description")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("The {} parameter", param));
                        if required.contains(&param.as_str()) {
                            ParamSpec::required(param, kind, &description)
                        } else {
                            ParamSpec::optional(param, kind, &description)
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self::new(name, description, params)
    }

    /// Build a descriptor from the schema of a Rust argument type
    pub fn for_args<A: JsonSchema>(name: &str, description: &str) -> Self {
        let schema = serde_json::to_value(schemars::schema_for!(A)).unwrap_or(Value::Null);
        Self::from_input_schema(name, description, &schema)
    }

    /// Build a descriptor from a discovered tool
    pub fn from_tool(tool: &Tool) -> Self {
        Self::from_input_schema(
            &tool.name,
            tool.description.as_deref().unwrap_or_default(),
            &tool.input_schema,
        )
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// JSON Schema of the arguments object
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    json!({"type": p.kind.as_str(), "description": p.description}),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// MCP wire form
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            input_schema: self.input_schema(),
        }
    }

    /// Provider function-calling form
    pub fn function_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.input_schema(),
            }
        })
    }

    /// One-line summary, e.g. `add: Add two numbers | Parameters: a: number (required)`
    pub fn summary(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| {
                format!(
                    "{}: {} ({})",
                    p.name,
                    p.kind,
                    if p.required { "required" } else { "optional" }
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}: {} | Parameters: {}", self.name, self.description, params)
    }

    /// Check `arguments` against the declared parameters
    pub fn validate(&self, arguments: Value) -> McpResult<Arguments> {
        let mut provided = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(McpError::InvalidArguments {
                    message: format!("expected an object, got {}", other),
                })
            }
        };

        let mut validated = Map::new();
        for param in &self.params {
            match provided.remove(&param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        return Err(McpError::MissingParameter {
                            name: param.name.clone(),
                        });
                    }
                }
                Some(value) => {
                    let coerced =
                        param
                            .kind
                            .coerce(&value)
                            .ok_or_else(|| McpError::InvalidParameter {
                                name: param.name.clone(),
                                expected: param.kind.to_string(),
                            })?;
                    validated.insert(param.name.clone(), coerced);
                }
            }
        }

        Ok(validated)
    }
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: ToolFn,
}

/// Ordered set of tools keyed by unique name
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.index.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool; fails if the name is taken
    pub fn register(&mut self, descriptor: ToolDescriptor, handler: ToolFn) -> McpResult<()> {
        if self.index.contains_key(&descriptor.name) {
            return Err(McpError::DuplicateTool {
                name: descriptor.name,
            });
        }

        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            handler,
        });
        Ok(())
    }

    /// Add a plain function whose argument struct doubles as its schema
    pub fn register_fn<A, F>(&mut self, name: &str, description: &str, f: F) -> McpResult<()>
    where
        A: DeserializeOwned + JsonSchema,
        F: Fn(A) -> Value + Send + Sync + 'static,
    {
        let descriptor = ToolDescriptor::for_args::<A>(name, description);
        let handler: ToolFn = Arc::new(move |args: Arguments| {
            let parsed: A = serde_json::from_value(Value::Object(args)).map_err(|e| {
                McpError::InvalidArguments {
                    message: e.to_string(),
                }
            })?;
            Ok(f(parsed))
        });
        self.register(descriptor, handler)
    }

    /// Descriptors in registration order
    pub fn list(&self) -> Vec<&ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor).collect()
    }

    /// Wire-form tool list in registration order
    pub fn tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.descriptor.to_tool()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i].descriptor)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate `arguments` and run the named tool
    pub fn invoke(&self, name: &str, arguments: Value) -> McpResult<Value> {
        let tool = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| McpError::ToolNotFound {
                name: name.to_string(),
            })?;

        let validated = tool.descriptor.validate(arguments)?;
        tracing::debug!(tool = name, "invoking tool");
        (tool.handler)(validated)
    }
}
