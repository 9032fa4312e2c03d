//! Offline tool selection
//!
//! When no LLM is available the bridge picks a tool with a fixed keyword
//! rule, so the same instruction always yields the same choice:
//!
//! 1. `weather`, `temperature` or `forecast` selects `get_weather` with the
//!    first known city mentioned (default London).
//! 2. Two or more numbers plus an operator word selects arithmetic on the
//!    first two numbers. Operators are checked in the order multiply, divide,
//!    subtract, add. A tool named after the operation wins over `calculate`.
//! 3. `user` selects `get_user_info` with the first integer (default 1).
//!
//! Tools that are not available are never selected.

use serde_json::{json, Map, Value};

use crate::catalog::tools::KNOWN_CITIES;
use crate::llm::bridge::ToolChoice;
use crate::mcp::registry::{number, ToolDescriptor};

const DEFAULT_CITY: &str = "London";
const DEFAULT_USER_ID: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Multiply,
    Divide,
    Subtract,
    Add,
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Subtract => "subtract",
            Operation::Add => "add",
        }
    }

    fn words(&self) -> &'static [&'static str] {
        match self {
            Operation::Multiply => &["times", "multiply", "multiplied", "product", "*"],
            Operation::Divide => &["divided", "divide", "over", "/"],
            Operation::Subtract => &["minus", "subtract", "subtracted", "difference"],
            Operation::Add => &["plus", "add", "added", "sum", "+"],
        }
    }

    fn detect(words: &[String]) -> Option<Self> {
        [
            Operation::Multiply,
            Operation::Divide,
            Operation::Subtract,
            Operation::Add,
        ]
        .into_iter()
        .find(|op| op.words().iter().any(|w| words.iter().any(|word| word == w)))
    }
}

/// Pick a tool for `instruction` among `available`
pub fn simulate_choice(instruction: &str, available: &[ToolDescriptor]) -> Option<ToolChoice> {
    let text = instruction.to_lowercase();
    let words = tokenize(&text);
    let numbers = numbers(&text);
    let has = |name: &str| available.iter().any(|d| d.name == name);
    let mentions = |candidates: &[&str]| candidates.iter().any(|c| words.iter().any(|w| w == c));

    if mentions(&["weather", "temperature", "forecast"]) && has("get_weather") {
        let city = KNOWN_CITIES
            .iter()
            .find(|city| text.contains(&city.to_lowercase()))
            .copied()
            .unwrap_or(DEFAULT_CITY);
        return Some(choice("get_weather", json!({"city": city})));
    }

    if numbers.len() >= 2 {
        if let Some(op) = Operation::detect(&words) {
            let (a, b) = (number(numbers[0]), number(numbers[1]));
            if has(op.name()) {
                return Some(choice(op.name(), json!({"a": a, "b": b})));
            }
            if has("calculate") {
                return Some(choice(
                    "calculate",
                    json!({"operation": op.name(), "a": a, "b": b}),
                ));
            }
        }
    }

    if mentions(&["user"]) && has("get_user_info") {
        let user_id = numbers
            .iter()
            .find(|n| n.fract() == 0.0)
            .map(|n| *n as i64)
            .unwrap_or(DEFAULT_USER_ID);
        return Some(choice("get_user_info", json!({"user_id": user_id})));
    }

    None
}

fn choice(name: &str, arguments: Value) -> ToolChoice {
    ToolChoice {
        name: name.to_string(),
        arguments: match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        },
    }
}

/// Words and the `+`, `*` and `/` symbols; `-` only joins words
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            current.push(c);
            continue;
        }
        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        if matches!(c, '+' | '*' | '/') {
            tokens.push(c.to_string());
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Unsigned decimal numbers in order of appearance
fn numbers(text: &str) -> Vec<f64> {
    text.split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .map(|s| s.trim_matches('.'))
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn all_tools() -> Vec<ToolDescriptor> {
        catalog::tool_registry()
            .unwrap()
            .list()
            .into_iter()
            .cloned()
            .collect()
    }

    fn only(names: &[&str]) -> Vec<ToolDescriptor> {
        all_tools()
            .into_iter()
            .filter(|d| names.contains(&d.name.as_str()))
            .collect()
    }

    fn args(choice: &ToolChoice) -> Value {
        Value::Object(choice.arguments.clone())
    }

    #[test]
    fn test_times_selects_multiply() {
        let choice = simulate_choice("what is 4 times 5", &all_tools()).unwrap();
        assert_eq!(choice.name, "multiply");
        assert_eq!(args(&choice), json!({"a": 4, "b": 5}));
    }

    #[test]
    fn test_divide_uses_calculate() {
        let choice = simulate_choice("Calculate 25 divided by 5", &all_tools()).unwrap();
        assert_eq!(choice.name, "calculate");
        assert_eq!(args(&choice), json!({"operation": "divide", "a": 25, "b": 5}));
    }

    #[test]
    fn test_add_prefers_dedicated_tool() {
        let choice = simulate_choice("Add 10 and 15", &all_tools()).unwrap();
        assert_eq!(choice.name, "add");

        let choice = simulate_choice("Add 10 and 15", &only(&["calculate"])).unwrap();
        assert_eq!(choice.name, "calculate");
        assert_eq!(choice.arguments["operation"], "add");
    }

    #[test]
    fn test_weather_city_detection() {
        let choice = simulate_choice("What's the weather like in Tokyo?", &all_tools()).unwrap();
        assert_eq!(args(&choice), json!({"city": "Tokyo"}));

        let choice = simulate_choice("What's the weather in New York?", &all_tools()).unwrap();
        assert_eq!(args(&choice), json!({"city": "New York"}));

        let choice = simulate_choice("weather please", &all_tools()).unwrap();
        assert_eq!(args(&choice), json!({"city": "London"}));
    }

    #[test]
    fn test_user_lookup() {
        let choice = simulate_choice("Get information for user ID 2", &all_tools()).unwrap();
        assert_eq!(choice.name, "get_user_info");
        assert_eq!(args(&choice), json!({"user_id": 2}));

        let choice = simulate_choice("Get user 3's information", &all_tools()).unwrap();
        assert_eq!(args(&choice), json!({"user_id": 3}));
    }

    #[test]
    fn test_no_match() {
        assert!(simulate_choice("tell me a joke", &all_tools()).is_none());
        assert!(simulate_choice("what is 4 times 5", &only(&["get_weather"])).is_none());
    }

    #[test]
    fn test_deterministic() {
        let tools = all_tools();
        let first = simulate_choice("what is 4 times 5", &tools);
        let second = simulate_choice("what is 4 times 5", &tools);
        assert_eq!(first, second);
    }

    #[test]
    fn test_address_is_not_add() {
        assert!(simulate_choice("my address has 12 and 14 in it", &all_tools()).is_none());
    }

    #[test]
    fn test_hyphen_is_not_an_operator() {
        let cases: &[(&str, Option<&str>)] = &[
            ("a well-known 7 and 3 pair", None),
            ("room 12-b and 4", None),
            ("10 - 4", None),
            ("7 minus 3", Some("calculate")),
            ("4 * 5", Some("multiply")),
            ("9 / 3", Some("calculate")),
        ];
        for (instruction, expected) in cases {
            let selected = simulate_choice(instruction, &all_tools()).map(|c| c.name);
            assert_eq!(selected.as_deref(), *expected, "instruction: {}", instruction);
        }
    }

    #[test]
    fn test_subtract_falls_back_to_calculate() {
        let choice = simulate_choice("7 minus 3", &all_tools()).unwrap();
        assert_eq!(choice.name, "calculate");
        assert_eq!(args(&choice), json!({"operation": "subtract", "a": 7, "b": 3}));
    }

    #[test]
    fn test_numbers_extraction() {
        assert_eq!(numbers("4 times 5."), vec![4.0, 5.0]);
        assert_eq!(numbers("2.5 plus 1"), vec![2.5, 1.0]);
    }
}
