//! Demo tools
//!
//! Plain functions over fixed lookup tables. They are registered on the MCP
//! server and called directly by the function-calling client.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::McpResult;
use crate::mcp::registry::{number, ToolRegistry};

/// Cities with weather data
pub const KNOWN_CITIES: &[&str] = &["New York", "London", "Tokyo"];

/// Supported `calculate` operations
pub const OPERATIONS: &[&str] = &["add", "subtract", "multiply", "divide"];

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WeatherArgs {
    /// City name (New York, London or Tokyo)
    pub city: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CalculateArgs {
    /// One of add, subtract, multiply, divide
    pub operation: String,
    /// First operand
    pub a: f64,
    /// Second operand
    pub b: f64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PairArgs {
    /// First operand
    pub a: f64,
    /// Second operand
    pub b: f64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UserInfoArgs {
    /// User ID (1, 2 or 3)
    pub user_id: i64,
}

/// Get weather information for a city.
pub fn get_weather(args: WeatherArgs) -> Value {
    match args.city.as_str() {
        "New York" => json!({"temperature": 22, "condition": "sunny", "humidity": 65}),
        "London" => json!({"temperature": 15, "condition": "cloudy", "humidity": 80}),
        "Tokyo" => json!({"temperature": 28, "condition": "rainy", "humidity": 90}),
        other => json!({"error": format!("Weather data not available for {}", other)}),
    }
}

/// Perform basic mathematical operations.
pub fn calculate(args: CalculateArgs) -> Value {
    let CalculateArgs { operation, a, b } = args;
    let result = match operation.as_str() {
        "add" => number(a + b),
        "subtract" => number(a - b),
        "multiply" => number(a * b),
        "divide" if b == 0.0 => json!("Error: Division by zero"),
        "divide" => number(a / b),
        _ => json!("Error: Invalid operation"),
    };
    json!({"operation": operation, "a": number(a), "b": number(b), "result": result})
}

/// Add two numbers.
pub fn add(args: PairArgs) -> Value {
    number(args.a + args.b)
}

/// Multiply two numbers.
pub fn multiply(args: PairArgs) -> Value {
    number(args.a * args.b)
}

/// Get user information by ID.
pub fn get_user_info(args: UserInfoArgs) -> Value {
    match args.user_id {
        1 => json!({"name": "Alice", "email": "alice@example.com", "role": "admin"}),
        2 => json!({"name": "Bob", "email": "bob@example.com", "role": "user"}),
        3 => json!({"name": "Charlie", "email": "charlie@example.com", "role": "manager"}),
        id => json!({"error": format!("User {} not found", id)}),
    }
}

/// Register every demo tool, in discovery order
pub fn register_all(registry: &mut ToolRegistry) -> McpResult<()> {
    registry.register_fn("get_weather", "Get weather information for a city.", get_weather)?;
    registry.register_fn("calculate", "Perform basic mathematical operations.", calculate)?;
    registry.register_fn("get_user_info", "Get user information by ID.", get_user_info)?;
    registry.register_fn("add", "Add two numbers.", add)?;
    registry.register_fn("multiply", "Multiply two numbers.", multiply)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_lookup() {
        let weather = get_weather(WeatherArgs {
            city: "Tokyo".to_string(),
        });
        assert_eq!(weather["condition"], "rainy");

        let missing = get_weather(WeatherArgs {
            city: "Paris".to_string(),
        });
        assert_eq!(missing["error"], "Weather data not available for Paris");
    }

    #[test]
    fn test_calculate_operations() {
        let result = calculate(CalculateArgs {
            operation: "divide".to_string(),
            a: 25.0,
            b: 5.0,
        });
        assert_eq!(result["result"], json!(5));
        assert_eq!(result["operation"], "divide");

        let result = calculate(CalculateArgs {
            operation: "divide".to_string(),
            a: 1.0,
            b: 0.0,
        });
        assert_eq!(result["result"], "Error: Division by zero");

        let result = calculate(CalculateArgs {
            operation: "modulo".to_string(),
            a: 1.0,
            b: 2.0,
        });
        assert_eq!(result["result"], "Error: Invalid operation");
    }

    #[test]
    fn test_user_lookup() {
        assert_eq!(get_user_info(UserInfoArgs { user_id: 2 })["name"], "Bob");
        assert_eq!(
            get_user_info(UserInfoArgs { user_id: 9 })["error"],
            "User 9 not found"
        );
    }

    #[test]
    fn test_register_all_schemas() {
        let mut registry = ToolRegistry::new();
        register_all(&mut registry).unwrap();
        assert_eq!(registry.len(), 5);

        let calculate = registry.get("calculate").unwrap();
        assert!(calculate.params.iter().all(|p| p.required));
        assert_eq!(calculate.params.len(), 3);

        let result = registry
            .invoke("get_user_info", json!({"user_id": "3"}))
            .unwrap();
        assert_eq!(result["name"], "Charlie");
    }
}
