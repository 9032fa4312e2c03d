//! MCP (Model Context Protocol) module
//!
//! Registries, the server with its stdio and HTTP transports, and the client.

pub mod client;
pub mod content;
pub mod http;
pub mod registry;
pub mod server;
pub mod types;
