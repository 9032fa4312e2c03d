//! Narrated demo flows
//!
//! Each flow prints what it does to stdout. Logging stays on stderr.

pub mod ai_mcp;
pub mod function_calling;
pub mod orchestrator;
pub mod simple;

use serde_json::Value;

use crate::llm::bridge::{BridgeOutcome, ChoiceSource};

/// Print a title underlined with `=`
pub(crate) fn heading(title: &str) {
    println!("\n{}", title);
    println!("{}", "=".repeat(title.chars().count()));
}

pub(crate) fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Shorten `text` to `max` characters
pub(crate) fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    format!("{}...", head)
}

pub(crate) fn print_outcome(outcome: &BridgeOutcome) {
    let label = match outcome.source {
        ChoiceSource::Llm => "AI selected",
        ChoiceSource::Simulated => "Simulated AI choice",
    };
    println!(
        "{}: {} with parameters {}",
        label,
        outcome.choice.name,
        Value::Object(outcome.choice.arguments.clone())
    );
    println!("   Result: {}", outcome.result);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
    }
}
