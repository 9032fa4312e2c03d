//! MCP Demo Library
//!
//! A small Model Context Protocol server with tools, resources and prompts,
//! an MCP client, and an LLM bridge that contrasts MCP tool discovery with
//! traditional in-process function calling.

pub mod catalog;
pub mod config;
pub mod demo;
pub mod error;
pub mod llm;
pub mod mcp;

pub use config::Config;
pub use error::{DemoError, Result};
