//! Domain layer: the Confluence tool surface
//!
//! Pure request construction and payload formatting, plus the MCP tool
//! definitions dispatching over them.

pub mod format;
pub mod requests;
pub mod tools;
