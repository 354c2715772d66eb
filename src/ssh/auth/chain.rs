//! Authentication chain for trying multiple strategies.

use async_trait::async_trait;
use russh::client;
use tracing::debug;

use crate::ssh::params::Credential;
use crate::ssh::session::SshClientHandler;

use super::traits::AuthStrategy;
use super::{KeyAuth, PasswordAuth};

/// Authentication chain that tries multiple strategies in order.
///
/// The first successful authentication stops the chain.
pub struct AuthChain {
    strategies: Vec<Box<dyn AuthStrategy>>,
}

impl AuthChain {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Build a chain with one strategy per credential, preserving order.
    pub fn from_credentials(credentials: &[Credential]) -> Self {
        credentials
            .iter()
            .fold(Self::new(), |chain, credential| match credential {
                Credential::Password(password) => chain.with_password(password.clone()),
                Credential::KeyFile { path, passphrase } => {
                    chain.with_strategy(KeyAuth::from_file(path.clone(), passphrase.clone()))
                }
                Credential::KeyData { pem, passphrase } => {
                    chain.with_strategy(KeyAuth::from_pem(pem.clone(), passphrase.clone()))
                }
            })
    }

    pub fn with_password(self, password: impl Into<String>) -> Self {
        self.with_strategy(PasswordAuth::new(password))
    }

    pub fn with_strategy(mut self, strategy: impl AuthStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }
}

impl Default for AuthChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthStrategy for AuthChain {
    async fn authenticate(
        &self,
        handle: &mut client::Handle<SshClientHandler>,
        username: &str,
    ) -> Result<bool, String> {
        if self.strategies.is_empty() {
            return Err("no authentication strategies configured".to_string());
        }

        let mut last_error = None;

        for strategy in &self.strategies {
            debug!("Trying authentication strategy: {}", strategy.name());

            match strategy.authenticate(handle, username).await {
                Ok(true) => {
                    debug!(
                        "Authentication succeeded with strategy: {}",
                        strategy.name()
                    );
                    return Ok(true);
                }
                Ok(false) => {
                    debug!("Authentication failed with strategy: {}", strategy.name());
                    last_error = Some(format!("{} authentication rejected", strategy.name()));
                }
                Err(e) => {
                    debug!(
                        "Authentication error with strategy {}: {}",
                        strategy.name(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| "all authentication methods failed".to_string()))
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}
