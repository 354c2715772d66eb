//! MCP surface of the remote access integration.
//!
//! This module is organized into the following submodules:
//!
//! - `dispatch`: Platform-style command dispatch and top-level failure reporting
//! - `types`: Serializable response types for MCP tools
//! - `message`: Markdown rendering for readable output
//! - `commands`: MCP tool implementations

pub mod commands;
pub mod dispatch;
pub mod message;
pub mod types;

pub use commands::RemoteAccessCommands;
pub use dispatch::{IntegrationError, dispatch};
pub use types::{CommandResults, IntegrationResponse};
