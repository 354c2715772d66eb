//! Serializable response types for the remote access tools.
//!
//! All types implement `Serialize`, `Deserialize`, and `JsonSchema` so they
//! can be returned as structured MCP content.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::mcp::message::TableBuilder;
use crate::ssh::CommandResult;

/// Context key the command outputs are published under
pub const OUTPUTS_PREFIX: &str = "RemoteAccess.Command";

/// Result object handed back to the automation platform for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommandResults {
    pub outputs_prefix: String,
    pub outputs: Vec<CommandResult>,
    /// Markdown table of the outputs for the war room
    pub readable_output: String,
}

impl CommandResults {
    /// Wrap a single command result, rendering its readable table.
    pub fn from_result(result: CommandResult) -> Self {
        let readable_output = TableBuilder::new(format!("Command {} Outputs", result.command))
            .headers(["command", "Output", "ErrorOutput"])
            .row([
                result.command.as_str(),
                result.output.as_str(),
                result.error_output.as_str(),
            ])
            .build();

        Self {
            outputs_prefix: OUTPUTS_PREFIX.to_string(),
            outputs: vec![result],
            readable_output,
        }
    }
}

/// What a successful dispatch returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum IntegrationResponse {
    /// Plain text answer (`ok` from the connectivity test)
    Text(String),
    /// Command outputs
    Results(CommandResults),
}
