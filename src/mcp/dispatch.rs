//! Platform-style command dispatch.
//!
//! The automation platform invokes the integration by command name with a
//! map of arguments. Two names are understood:
//!
//! - `test-module`: connect, authenticate, disconnect; answers `ok`
//! - `ssh`: run the `command` argument and return its outputs
//!
//! Every failure is logged and surfaced with the platform's flat message
//! format, while the typed [`RunnerError`] stays available to callers.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::mcp::types::{CommandResults, IntegrationResponse};
use crate::ssh::{CommandRunner, IntegrationParams, RunnerError};

/// Connectivity check command
pub const TEST_MODULE: &str = "test-module";
/// Remote command execution command
pub const SSH: &str = "ssh";

/// Top-level failure of one dispatch.
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("Failed to execute {0} command.\nError:\nCommand '{0}' is not implemented.")]
    NotImplemented(String),

    #[error("Failed to execute {command} command.\nError:\n{source}")]
    Failed {
        command: String,
        #[source]
        source: RunnerError,
    },
}

impl IntegrationError {
    fn failed(command: &str, source: RunnerError) -> Self {
        Self::Failed {
            command: command.to_string(),
            source,
        }
    }

    /// The typed runner error behind this failure, if any.
    pub fn runner_error(&self) -> Option<&RunnerError> {
        match self {
            Self::Failed { source, .. } => Some(source),
            Self::NotImplemented(_) => None,
        }
    }
}

/// Run the platform command `command_name` with `args`.
pub async fn dispatch(
    runner: &CommandRunner,
    params: &IntegrationParams,
    command_name: &str,
    args: &Map<String, Value>,
) -> Result<IntegrationResponse, IntegrationError> {
    let span = info_span!(
        "dispatch",
        invocation_id = %Uuid::new_v4(),
        command = %command_name
    );

    async {
        info!("Command being called is {}", command_name);

        let result = match command_name {
            TEST_MODULE => run_test_module(runner, params).await,
            SSH => run_ssh(runner, params, args).await,
            other => Err(IntegrationError::NotImplemented(other.to_string())),
        };

        if let Err(e) = &result {
            error!("{}", e);
        }
        result
    }
    .instrument(span)
    .await
}

async fn run_test_module(
    runner: &CommandRunner,
    params: &IntegrationParams,
) -> Result<IntegrationResponse, IntegrationError> {
    let fail = |e| IntegrationError::failed(TEST_MODULE, e);

    let connection = params.to_connection_parameters().map_err(fail)?;
    runner.test_connectivity(&connection).await.map_err(fail)?;

    Ok(IntegrationResponse::Text("ok".to_string()))
}

async fn run_ssh(
    runner: &CommandRunner,
    params: &IntegrationParams,
    args: &Map<String, Value>,
) -> Result<IntegrationResponse, IntegrationError> {
    let fail = |e| IntegrationError::failed(SSH, e);

    let command = required_str(args, "command").map_err(fail)?;
    let timeout_secs = optional_u64(args, "timeout_secs").map_err(fail)?;
    let connection = params.to_connection_parameters().map_err(fail)?;

    let runner = CommandRunner::with_options(runner.options().with_command_timeout_secs(timeout_secs));
    let result = runner.execute(&connection, command).await.map_err(fail)?;

    Ok(IntegrationResponse::Results(CommandResults::from_result(
        result,
    )))
}

fn required_str<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a str, RunnerError> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(Value::Null) | None => Err(RunnerError::invalid_input(format!(
            "missing required argument '{}'",
            name
        ))),
        Some(other) => Err(RunnerError::invalid_input(format!(
            "argument '{}' must be a string, got {}",
            name, other
        ))),
    }
}

/// Accepts a non-negative integer or its decimal string form.
fn optional_u64(args: &Map<String, Value>, name: &str) -> Result<Option<u64>, RunnerError> {
    let invalid = || {
        RunnerError::invalid_input(format!(
            "argument '{}' must be a non-negative integer",
            name
        ))
    };

    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}
