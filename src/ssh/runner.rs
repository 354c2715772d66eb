//! Public entry points: run one command, or just prove connectivity.
//!
//! Every call opens its own session and always tears it down before
//! returning, whatever the outcome. Nothing is shared between calls.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::ssh::client::{connect_with_retry, disconnect, execute_command};
use crate::ssh::config::RunnerOptions;
use crate::ssh::error::RunnerError;
use crate::ssh::params::ConnectionParameters;
use crate::ssh::types::CommandResult;

/// Runs commands on remote hosts with a fixed set of [`RunnerOptions`].
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    options: RunnerOptions,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RunnerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Connect, run `command` once, and return both output streams.
    ///
    /// A non-zero exit status is not an error. The output is decoded as
    /// UTF-8 with invalid sequences replaced.
    pub async fn execute(
        &self,
        params: &ConnectionParameters,
        command: &str,
    ) -> Result<CommandResult, RunnerError> {
        self.execute_with_cancel(params, command, CancellationToken::new())
            .await
    }

    /// Like [`CommandRunner::execute`], aborting when `cancel` fires.
    pub async fn execute_with_cancel(
        &self,
        params: &ConnectionParameters,
        command: &str,
        cancel: CancellationToken,
    ) -> Result<CommandResult, RunnerError> {
        if command.is_empty() {
            return Err(RunnerError::invalid_input("command must not be empty"));
        }
        if cancel.is_cancelled() {
            return Err(RunnerError::Cancelled);
        }

        info!(
            "Running remote command on {}@{}",
            params.username(),
            params.target()
        );

        let (handle, _retries) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RunnerError::Cancelled),
            connected = connect_with_retry(params, &self.options) => connected?,
        };

        let outcome = execute_command(
            &handle,
            command,
            params.interactive_terminal(),
            self.options.command_timeout,
            &cancel,
        )
        .await;

        disconnect(&handle).await;

        let captured = outcome?;
        debug!(
            "Remote command on {} exited with status {:?}",
            params.target(),
            captured.exit_status
        );

        Ok(CommandResult::new(
            command,
            String::from_utf8_lossy(&captured.stdout),
            String::from_utf8_lossy(&captured.stderr),
        ))
    }

    /// Connect and authenticate, then disconnect without running anything.
    pub async fn test_connectivity(&self, params: &ConnectionParameters) -> Result<(), RunnerError> {
        let (handle, _retries) = connect_with_retry(params, &self.options).await?;
        disconnect(&handle).await;
        info!("Connectivity check to {} succeeded", params.target());
        Ok(())
    }
}

/// Run `command` with default runner options.
pub async fn execute(
    params: &ConnectionParameters,
    command: &str,
) -> Result<CommandResult, RunnerError> {
    CommandRunner::default().execute(params, command).await
}

/// Check connectivity with default runner options.
pub async fn test_connectivity(params: &ConnectionParameters) -> Result<(), RunnerError> {
    CommandRunner::default().test_connectivity(params).await
}
