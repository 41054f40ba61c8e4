//! MCP (Model Context Protocol) server exposing the tools API over stdio.
//!
//! The server is a dispatch shim: every `tools/call` maps onto one
//! [`crate::ToolsClient`] method, and typed client errors come back as
//! JSON-RPC errors that keep their [`crate::ErrorKind`].
//!
//! 1. **Protocol** (`protocol`): JSON-RPC 2.0 message types
//! 2. **Server** (`server`): lifecycle, tool catalogue and dispatch

pub mod protocol;
pub mod server;

pub use protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolDefinition, MCP_PROTOCOL_VERSION,
};
pub use server::{serve_stdio, McpServer, SERVER_NAME};
