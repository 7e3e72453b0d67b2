//! HTTP transport layer for the Model Context Protocol
//!
//! External API routing: the `/mcp` JSON-RPC listener plus metadata endpoints.

pub mod handlers;
