//! SSH command runner.
//!
//! This module is organized into the following submodules:
//!
//! - `params`: Immutable connection parameters and platform parameter parsing
//! - `config`: Runner options with environment variable support
//! - `error`: Tagged runner errors and transient-failure classification
//! - `session`: russh client handler applying the host key policy
//! - `auth`: Password and private key authentication strategies
//! - `client`: Connection establishment and single-command execution
//! - `runner`: The public `execute` / `test_connectivity` entry points
//! - `types`: The serializable command result

pub(crate) mod auth;
pub(crate) mod client;
pub mod config;
pub mod error;
pub mod params;
pub mod runner;
pub(crate) mod session;
#[cfg(test)]
pub(crate) mod test_server;
pub mod types;

pub use config::RunnerOptions;
pub use error::{ErrorKind, RunnerError};
pub use params::{ConnectionParameters, Credential, HostKeyPolicy, IntegrationParams};
pub use runner::{CommandRunner, execute, test_connectivity};
pub use types::CommandResult;
