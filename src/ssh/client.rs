//! SSH connection and single-command execution.
//!
//! ## Connection Lifecycle
//!
//! 1. **Client Configuration**: keepalive, compression and the optional
//!    cipher allow-list are turned into a russh client configuration.
//!
//! 2. **Connection Establishment**: TCP connect plus key exchange, bounded by
//!    the connect timeout. The host key is checked by [`SshClientHandler`].
//!
//! 3. **Authentication**: every configured credential is tried in order via
//!    [`AuthChain`].
//!
//! 4. **Command Execution**: one session channel, optionally with a PTY, runs
//!    the command; stdout and stderr are collected until the channel closes.
//!
//! 5. **Teardown**: the session is always disconnected by the caller.
//!
//! ## Retry Strategy
//!
//! Connection attempts are retried only when the caller asked for retries and
//! the failure is transient ([`RunnerError::is_retryable`]). Backoff is
//! exponential with jitter via the `backon` crate, capped at
//! [`MAX_RETRY_DELAY`]. Authentication failures are never retried.

use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use russh::{ChannelMsg, Disconnect, cipher, client};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::ssh::auth::{AuthChain, AuthStrategy};
use crate::ssh::config::{MAX_RETRY_DELAY, RunnerOptions};
use crate::ssh::error::RunnerError;
use crate::ssh::params::ConnectionParameters;
use crate::ssh::session::{RejectedKeySlot, SshClientHandler};

pub(crate) type SshHandle = client::Handle<SshClientHandler>;

/// Terminal type requested when interactive terminal mode is on
const PTY_TERM: &str = "xterm";
const PTY_COLUMNS: u32 = 80;
const PTY_ROWS: u32 = 24;

/// Raw streams collected from one exec channel.
#[derive(Debug, Default)]
pub(crate) struct CapturedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_status: Option<u32>,
}

/// Build russh client configuration.
///
/// - No inactivity timeout: a quiet command may legitimately run for a long
///   time. Dead peers are still detected through keepalives.
/// - Keepalive interval of 30 seconds with max 3 keepalives
/// - ZLIB offered first when `compress` is set
/// - Cipher preference replaced by `ciphers` when the allow-list is non-empty
pub(crate) fn build_client_config(compress: bool, ciphers: &[cipher::Name]) -> Arc<client::Config> {
    let compression = if compress {
        (&[russh::compression::ZLIB, russh::compression::NONE][..]).into()
    } else {
        (&[russh::compression::NONE][..]).into()
    };

    let mut preferred = russh::Preferred {
        compression,
        ..Default::default()
    };
    if !ciphers.is_empty() {
        preferred.cipher = Cow::Owned(ciphers.to_vec());
    }

    Arc::new(client::Config {
        inactivity_timeout: None,
        keepalive_interval: Some(Duration::from_secs(30)),
        keepalive_max: 3,
        preferred,
        ..Default::default()
    })
}

/// Connect with retry logic using exponential backoff with jitter.
///
/// Returns the authenticated handle and the number of retries that were
/// needed.
pub(crate) async fn connect_with_retry(
    params: &ConnectionParameters,
    options: &RunnerOptions,
) -> Result<(SshHandle, u32), RunnerError> {
    let attempt_counter = AtomicU32::new(0);
    let counter = &attempt_counter;
    let options = *options;
    let target = params.target();

    let backoff = ExponentialBuilder::default()
        .with_min_delay(options.retry_delay)
        .with_max_delay(MAX_RETRY_DELAY)
        .with_max_times(options.max_retries as usize)
        .with_jitter();

    let result = (move || async move {
        let current_attempt = counter.fetch_add(1, Ordering::SeqCst);
        if current_attempt > 0 {
            warn!(
                "SSH connection retry attempt {} to {}@{}",
                current_attempt,
                params.username(),
                params.target()
            );
        }
        connect(params, &options).await
    })
    .retry(backoff)
    .when(|e: &RunnerError| e.is_retryable())
    .notify(|err: &RunnerError, dur: Duration| {
        warn!("SSH connection failed: {}. Retrying in {:?}", err, dur);
    })
    .await;

    let total_attempts = attempt_counter.load(Ordering::SeqCst);
    let retry_count = total_attempts.saturating_sub(1);

    match result {
        Ok(handle) => {
            if retry_count > 0 {
                info!(
                    "SSH connection to {}@{} succeeded after {} retry attempt(s)",
                    params.username(),
                    target,
                    retry_count
                );
            }
            Ok((handle, retry_count))
        }
        Err(e) => {
            error!(
                "SSH connection to {}@{} failed after {} attempt(s). Last error: {}",
                params.username(),
                target,
                total_attempts,
                e
            );
            Err(e)
        }
    }
}

/// Establish one SSH connection and authenticate.
async fn connect(
    params: &ConnectionParameters,
    options: &RunnerOptions,
) -> Result<SshHandle, RunnerError> {
    let target = params.target();
    let config = build_client_config(options.compress, params.ciphers());
    let handler = SshClientHandler::new(target.clone(), params.host_key_policy().clone());
    let rejected = handler.rejected_fingerprint();

    let connect_future = client::connect(config, (params.host(), params.port()), handler);

    let mut handle = match tokio::time::timeout(options.connect_timeout, connect_future).await {
        Ok(Ok(handle)) => handle,
        Ok(Err(e)) => return Err(classify_connect_error(&target, e, &rejected)),
        Err(_) => {
            return Err(RunnerError::connection(
                &target,
                format!("connection timed out after {:?}", options.connect_timeout),
            ));
        }
    };

    let auth_chain = AuthChain::from_credentials(params.credentials());
    match auth_chain.authenticate(&mut handle, params.username()).await {
        Ok(true) => {
            info!("Authenticated to {} as {}", target, params.username());
            Ok(handle)
        }
        Ok(false) => Err(RunnerError::authentication(
            params.username(),
            "no authentication methods succeeded",
        )),
        Err(e) => Err(RunnerError::authentication(params.username(), e)),
    }
}

/// Map a handshake failure, preferring a recorded host key rejection.
fn classify_connect_error(target: &str, e: russh::Error, rejected: &RejectedKeySlot) -> RunnerError {
    let fingerprint = rejected.lock().ok().and_then(|slot| slot.clone());
    match fingerprint {
        Some(fingerprint) => RunnerError::HostKeyRejected {
            target: target.to_string(),
            fingerprint,
        },
        None => RunnerError::connection(target, e),
    }
}

/// Run `command` on an authenticated session and capture both streams.
///
/// Waits until the channel closes, `timeout` (if any) elapses, or `cancel`
/// fires. On timeout or cancellation the channel is closed and no partial
/// output is returned.
pub(crate) async fn execute_command(
    handle: &SshHandle,
    command: &str,
    pty: bool,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<CapturedOutput, RunnerError> {
    let mut channel = handle
        .channel_open_session()
        .await
        .map_err(|e| RunnerError::execution(format!("failed to open channel: {}", e)))?;

    if pty {
        channel
            .request_pty(false, PTY_TERM, PTY_COLUMNS, PTY_ROWS, 0, 0, &[])
            .await
            .map_err(|e| RunnerError::execution(format!("failed to request pty: {}", e)))?;
    }

    channel
        .exec(true, command)
        .await
        .map_err(|e| RunnerError::execution(format!("failed to execute command: {}", e)))?;

    let outcome = tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            warn!("Remote command cancelled: {}", command);
            Err(RunnerError::Cancelled)
        }

        _ = expire(timeout) => {
            let limit = timeout.unwrap_or_default();
            warn!("Remote command timed out after {:?}: {}", limit, command);
            Err(RunnerError::Timeout(limit))
        }

        captured = collect_output(&mut channel) => Ok(captured),
    };

    let _ = channel.close().await;

    if let Ok(captured) = &outcome {
        debug!(
            "Remote command finished with exit status {:?} ({} bytes stdout, {} bytes stderr)",
            captured.exit_status,
            captured.stdout.len(),
            captured.stderr.len()
        );
    }

    outcome
}

/// Resolve after `timeout`, or never when there is none.
async fn expire(timeout: Option<Duration>) {
    match timeout {
        Some(limit) => tokio::time::sleep(limit).await,
        None => std::future::pending::<()>().await,
    }
}

/// Read channel messages until the command is done.
async fn collect_output(channel: &mut russh::Channel<client::Msg>) -> CapturedOutput {
    let mut captured = CapturedOutput {
        stdout: Vec::with_capacity(4096),
        stderr: Vec::with_capacity(1024),
        exit_status: None,
    };

    loop {
        match channel.wait().await {
            Some(ChannelMsg::Data { data }) => {
                captured.stdout.extend_from_slice(&data);
            }
            Some(ChannelMsg::ExtendedData { data, ext }) => {
                // ext == 1 is stderr in SSH protocol
                if ext == 1 {
                    captured.stderr.extend_from_slice(&data);
                }
            }
            Some(ChannelMsg::ExitStatus { exit_status }) => {
                captured.exit_status = Some(exit_status);
            }
            Some(ChannelMsg::Eof) => {
                // Keep reading until the exit status arrives
                if captured.exit_status.is_some() {
                    break;
                }
            }
            Some(ChannelMsg::Close) | None => break,
            Some(_) => {}
        }
    }

    captured
}

/// Close the session, logging rather than failing on errors.
pub(crate) async fn disconnect(handle: &SshHandle) {
    if let Err(e) = handle
        .disconnect(Disconnect::ByApplication, "Command finished", "en")
        .await
    {
        warn!("Error during disconnect: {}", e);
    }
}
