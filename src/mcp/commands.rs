//! MCP tool implementations for the remote access integration.
//!
//! - `ssh`: Run one command on the configured host and return its outputs
//! - `test_module`: Verify the host is reachable and the credentials work
//!
//! Both tools go through [`dispatch`], so they behave exactly like the
//! platform commands `ssh` and `test-module`.

use std::sync::Arc;

use poem_mcpserver::{Tools, content::Text, tool::StructuredContent};
use serde_json::{Map, Value};

use super::dispatch::{SSH, TEST_MODULE, dispatch};
use super::types::{CommandResults, IntegrationResponse};
use crate::ssh::{CommandRunner, IntegrationParams, RunnerOptions};

/// Remote access tools bound to one integration instance.
#[derive(Clone)]
pub struct RemoteAccessCommands {
    params: Arc<IntegrationParams>,
    options: RunnerOptions,
}

impl RemoteAccessCommands {
    pub fn new(params: Arc<IntegrationParams>, options: RunnerOptions) -> Self {
        Self { params, options }
    }

    /// Instance configured from `REMOTE_ACCESS_*` and `SSH_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(
            Arc::new(IntegrationParams::from_env()),
            RunnerOptions::from_env(),
        )
    }

    fn runner(&self) -> CommandRunner {
        CommandRunner::with_options(self.options)
    }
}

#[Tools]
impl RemoteAccessCommands {
    /// Run a command on the configured remote host over SSH.
    ///
    /// Returns the command's standard output and standard error. A non-zero
    /// exit status is not reported as a failure.
    async fn ssh(
        &self,
        /// The command to run (e.g., "uname -a")
        command: String,
        /// Command timeout in seconds, 0 for no limit (default: none, env: SSH_COMMAND_TIMEOUT)
        timeout_secs: Option<u64>,
    ) -> Result<StructuredContent<CommandResults>, String> {
        let mut args = Map::new();
        args.insert("command".to_string(), Value::String(command));
        if let Some(secs) = timeout_secs {
            args.insert("timeout_secs".to_string(), Value::from(secs));
        }

        match dispatch(&self.runner(), &self.params, SSH, &args).await {
            Ok(IntegrationResponse::Results(results)) => Ok(StructuredContent(results)),
            Ok(IntegrationResponse::Text(text)) => Err(format!("Unexpected response: {}", text)),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Test connectivity and authentication to the configured host.
    ///
    /// Answers `ok` when a session can be established. No command is run.
    async fn test_module(&self) -> Result<Text<String>, String> {
        match dispatch(&self.runner(), &self.params, TEST_MODULE, &Map::new()).await {
            Ok(IntegrationResponse::Text(text)) => Ok(Text(text)),
            Ok(IntegrationResponse::Results(_)) => Err("Unexpected response".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }
}
