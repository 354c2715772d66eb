//! Remote Access integration.
//!
//! Runs a single shell command on a remote host over SSH and hands the
//! captured standard output and standard error back to the calling
//! automation platform.
//!
//! - [`ssh`]: the command runner and its connection plumbing
//! - [`mcp`]: the platform-facing adapter and MCP tool server

pub mod mcp;
pub mod ssh;
