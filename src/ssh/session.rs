//! russh client handler.
//!
//! [`SshClientHandler`] applies the configured [`HostKeyPolicy`] when the
//! server presents its host key:
//!
//! - `AcceptNew` accepts any key (trust on first use) and logs its SHA-256
//!   fingerprint so the identity is recorded for the invocation.
//! - `Pinned` accepts only listed fingerprints. A rejected key makes russh
//!   fail the handshake with `Error::UnknownKey`; the fingerprint is kept in
//!   [`SshClientHandler::rejected_fingerprint`] so the caller can report it.
//!
//! Nothing is persisted: each connection gets a fresh handler.

use std::sync::{Arc, Mutex};

use russh::{client, keys};
use tracing::{error, info};

use crate::ssh::params::HostKeyPolicy;

/// Slot the handler fills with the fingerprint of a rejected host key.
pub(crate) type RejectedKeySlot = Arc<Mutex<Option<String>>>;

pub struct SshClientHandler {
    target: String,
    policy: HostKeyPolicy,
    rejected: RejectedKeySlot,
}

impl SshClientHandler {
    pub(crate) fn new(target: impl Into<String>, policy: HostKeyPolicy) -> Self {
        Self {
            target: target.into(),
            policy,
            rejected: Arc::new(Mutex::new(None)),
        }
    }

    /// Shared handle to the rejected-fingerprint slot.
    ///
    /// Must be taken before the handler is moved into `client::connect`.
    pub(crate) fn rejected_fingerprint(&self) -> RejectedKeySlot {
        self.rejected.clone()
    }

    /// Decide on a presented fingerprint, recording rejections.
    fn verify(&self, fingerprint: &str) -> bool {
        if self.policy.accepts(fingerprint) {
            match self.policy {
                HostKeyPolicy::AcceptNew => info!(
                    host = %self.target,
                    fingerprint = %fingerprint,
                    "Accepting host key (trust on first use)"
                ),
                HostKeyPolicy::Pinned(_) => info!(
                    host = %self.target,
                    fingerprint = %fingerprint,
                    "Host key matches pinned fingerprint"
                ),
            }
            return true;
        }

        error!(
            host = %self.target,
            fingerprint = %fingerprint,
            "Host key is not pinned - rejecting connection"
        );
        if let Ok(mut slot) = self.rejected.lock() {
            *slot = Some(fingerprint.to_string());
        }
        false
    }
}

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key
            .fingerprint(keys::HashAlg::Sha256)
            .to_string();
        Ok(self.verify(&fingerprint))
    }
}
