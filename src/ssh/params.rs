//! Connection parameters.
//!
//! [`ConnectionParameters`] is the immutable description of where and how to
//! connect for one invocation. It is either assembled through
//! [`ConnectionParameters::builder`] or parsed from the platform's parameter
//! mapping via [`IntegrationParams`].
//!
//! # Platform Parameters
//!
//! The platform hands parameters over loosely typed: ports may arrive as
//! strings, lists as comma separated strings, booleans as `"true"`. The
//! helpers in this module accept the same spellings the platform produces
//! and reject anything else with [`RunnerError::InvalidInput`].

use std::fmt;
use std::path::PathBuf;

use russh::cipher;
use serde::Deserialize;
use serde_json::Value;

use crate::ssh::error::RunnerError;

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Cipher names that never belong in an allow-list.
const EXCLUDED_CIPHERS: &[&str] = &["clear", "none"];

/// Every encrypting cipher russh implements, in russh's own order.
fn supported_ciphers() -> impl Iterator<Item = cipher::Name> {
    cipher::ALL_CIPHERS
        .iter()
        .map(|c| {
            let name: &cipher::Name = c;
            *name
        })
        .filter(|c| !EXCLUDED_CIPHERS.contains(&c.as_ref()))
}

pub(crate) const HOSTNAME_ENV_VAR: &str = "REMOTE_ACCESS_HOSTNAME";
pub(crate) const PORT_ENV_VAR: &str = "REMOTE_ACCESS_PORT";
pub(crate) const USERNAME_ENV_VAR: &str = "REMOTE_ACCESS_USERNAME";
pub(crate) const PASSWORD_ENV_VAR: &str = "REMOTE_ACCESS_PASSWORD";
pub(crate) const KEY_PATH_ENV_VAR: &str = "REMOTE_ACCESS_KEY_PATH";
pub(crate) const KEY_PASSPHRASE_ENV_VAR: &str = "REMOTE_ACCESS_KEY_PASSPHRASE";
pub(crate) const CIPHERS_ENV_VAR: &str = "REMOTE_ACCESS_CIPHERS";
pub(crate) const INTERACTIVE_TERMINAL_ENV_VAR: &str = "REMOTE_ACCESS_INTERACTIVE_TERMINAL_MODE";
pub(crate) const INSECURE_ENV_VAR: &str = "REMOTE_ACCESS_INSECURE";
pub(crate) const PROXY_ENV_VAR: &str = "REMOTE_ACCESS_PROXY";
pub(crate) const HOST_KEY_FINGERPRINTS_ENV_VAR: &str = "REMOTE_ACCESS_HOST_KEY_FINGERPRINTS";

/// A credential used to authenticate the SSH user.
#[derive(Clone)]
pub enum Credential {
    Password(String),
    /// Private key loaded from a file on disk
    KeyFile {
        path: PathBuf,
        passphrase: Option<String>,
    },
    /// Private key supplied inline in OpenSSH/PEM format
    KeyData {
        pem: String,
        passphrase: Option<String>,
    },
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Password(_) => f.write_str("Password(<redacted>)"),
            Credential::KeyFile { path, .. } => {
                f.debug_struct("KeyFile").field("path", path).finish_non_exhaustive()
            }
            Credential::KeyData { .. } => f.write_str("KeyData(<redacted>)"),
        }
    }
}

/// How the server's host key is verified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Trust on first use: accept any key and log its fingerprint.
    #[default]
    AcceptNew,
    /// Accept only the listed SHA-256 fingerprints (`SHA256:<base64>`).
    Pinned(Vec<String>),
}

impl HostKeyPolicy {
    /// Whether a server key with the given fingerprint is acceptable.
    pub fn accepts(&self, fingerprint: &str) -> bool {
        match self {
            HostKeyPolicy::AcceptNew => true,
            HostKeyPolicy::Pinned(pinned) => {
                let presented = normalize_fingerprint(fingerprint);
                pinned
                    .iter()
                    .any(|candidate| normalize_fingerprint(candidate) == presented)
            }
        }
    }
}

/// Strip the `SHA256:` prefix and base64 padding so both spellings compare equal.
fn normalize_fingerprint(fingerprint: &str) -> &str {
    let trimmed = fingerprint.trim();
    let without_prefix = match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("sha256:") => &trimmed[7..],
        _ => trimmed,
    };
    without_prefix.trim_end_matches('=')
}

/// Immutable connection parameters for one invocation.
#[derive(Debug, Clone)]
pub struct ConnectionParameters {
    host: String,
    port: u16,
    username: String,
    credentials: Vec<Credential>,
    ciphers: Vec<cipher::Name>,
    interactive_terminal: bool,
    verify_certificate: bool,
    use_proxy: bool,
    host_key_policy: HostKeyPolicy,
}

impl ConnectionParameters {
    /// Start building parameters for `username@host`.
    pub fn builder(
        host: impl Into<String>,
        username: impl Into<String>,
    ) -> ConnectionParametersBuilder {
        ConnectionParametersBuilder::new(host, username)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Credentials in the order they are attempted.
    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    /// Cipher allow-list; empty means the client defaults.
    pub fn ciphers(&self) -> &[cipher::Name] {
        &self.ciphers
    }

    pub fn interactive_terminal(&self) -> bool {
        self.interactive_terminal
    }

    /// TLS verification toggle carried over from the platform parameters.
    ///
    /// SSH does not use it.
    pub fn verify_certificate(&self) -> bool {
        self.verify_certificate
    }

    /// Outbound proxy toggle carried over from the platform parameters.
    ///
    /// SSH does not use it.
    pub fn use_proxy(&self) -> bool {
        self.use_proxy
    }

    pub fn host_key_policy(&self) -> &HostKeyPolicy {
        &self.host_key_policy
    }

    /// `host:port`, with IPv6 hosts bracketed.
    pub fn target(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Fluent builder for [`ConnectionParameters`].
///
/// # Example
///
/// ```ignore
/// let params = ConnectionParameters::builder("10.0.0.5", "admin")
///     .password("secret")
///     .ciphers(["aes256-ctr"])
///     .build()?;
/// ```
pub struct ConnectionParametersBuilder {
    host: String,
    port: Option<u16>,
    username: String,
    credentials: Vec<Credential>,
    ciphers: Vec<String>,
    interactive_terminal: bool,
    verify_certificate: bool,
    use_proxy: bool,
    host_key_policy: HostKeyPolicy,
}

impl ConnectionParametersBuilder {
    fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: username.into(),
            credentials: Vec::new(),
            ciphers: Vec::new(),
            interactive_terminal: false,
            verify_certificate: true,
            use_proxy: false,
            host_key_policy: HostKeyPolicy::AcceptNew,
        }
    }

    /// Port used when the host does not carry one (default 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.credentials.push(Credential::Password(password.into()));
        self
    }

    pub fn key_file(mut self, path: impl Into<PathBuf>, passphrase: Option<String>) -> Self {
        self.credentials.push(Credential::KeyFile {
            path: path.into(),
            passphrase,
        });
        self
    }

    pub fn key_data(mut self, pem: impl Into<String>, passphrase: Option<String>) -> Self {
        self.credentials.push(Credential::KeyData {
            pem: pem.into(),
            passphrase,
        });
        self
    }

    pub fn ciphers<I, S>(mut self, ciphers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ciphers = ciphers.into_iter().map(Into::into).collect();
        self
    }

    pub fn interactive_terminal(mut self, enabled: bool) -> Self {
        self.interactive_terminal = enabled;
        self
    }

    pub fn verify_certificate(mut self, verify: bool) -> Self {
        self.verify_certificate = verify;
        self
    }

    pub fn use_proxy(mut self, proxy: bool) -> Self {
        self.use_proxy = proxy;
        self
    }

    pub fn host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }

    /// Validate and freeze the parameters.
    pub fn build(self) -> Result<ConnectionParameters, RunnerError> {
        let address = self.host.trim();
        if address.is_empty() {
            return Err(RunnerError::invalid_input("hostname must not be empty"));
        }
        if self.username.trim().is_empty() {
            return Err(RunnerError::invalid_input("username must not be empty"));
        }
        if self.credentials.is_empty() {
            return Err(RunnerError::invalid_input(
                "no password or private key configured",
            ));
        }

        let (host, port) = parse_address(address, self.port.unwrap_or(DEFAULT_SSH_PORT))
            .map_err(RunnerError::InvalidInput)?;
        if host.is_empty() {
            return Err(RunnerError::invalid_input("hostname must not be empty"));
        }

        let ciphers = self
            .ciphers
            .iter()
            .map(|name| resolve_cipher(name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ConnectionParameters {
            host,
            port,
            username: self.username,
            credentials: self.credentials,
            ciphers,
            interactive_terminal: self.interactive_terminal,
            verify_certificate: self.verify_certificate,
            use_proxy: self.use_proxy,
            host_key_policy: self.host_key_policy,
        })
    }
}

fn resolve_cipher(name: &str) -> Result<cipher::Name, RunnerError> {
    supported_ciphers()
        .find(|supported| supported.as_ref() == name)
        .ok_or_else(|| {
            let known: Vec<cipher::Name> = supported_ciphers().collect();
            let known: Vec<&str> = known.iter().map(|c| c.as_ref()).collect();
            RunnerError::invalid_input(format!(
                "unsupported cipher '{}' (supported: {})",
                name,
                known.join(", ")
            ))
        })
}

/// Parse an address into host and port components.
///
/// Supports `host`, `host:port`, `[v6]`, `[v6]:port` and bare IPv6 literals.
/// Brackets are stripped from the returned host.
pub(crate) fn parse_address(address: &str, default_port: u16) -> Result<(String, u16), String> {
    if let Some(rest) = address.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| format!("Invalid address: {}", address))?;
        return match after.strip_prefix(':') {
            Some(port_str) => Ok((host.to_string(), parse_port(port_str)?)),
            None if after.is_empty() => Ok((host.to_string(), default_port)),
            None => Err(format!("Invalid address: {}", address)),
        };
    }

    // More than one colon without brackets is a bare IPv6 literal
    if address.matches(':').count() > 1 {
        return Ok((address.to_string(), default_port));
    }

    if let Some((host, port_str)) = address.rsplit_once(':') {
        Ok((host.to_string(), parse_port(port_str)?))
    } else {
        Ok((address.to_string(), default_port))
    }
}

fn parse_port(port_str: &str) -> Result<u16, String> {
    port_str
        .trim()
        .parse::<u16>()
        .map_err(|e| format!("Invalid port number: {}", e))
}

/// Credential block of the platform parameters.
#[derive(Clone, Default, Deserialize)]
pub struct PlatformCredentials {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub key_path: Option<String>,
    #[serde(default)]
    pub passphrase: Option<String>,
}

impl fmt::Debug for PlatformCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformCredentials")
            .field("identifier", &self.identifier)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("key_path", &self.key_path)
            .finish_non_exhaustive()
    }
}

/// Integration instance parameters as supplied by the platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntegrationParams {
    #[serde(default)]
    pub credentials: PlatformCredentials,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub port: Option<Value>,
    #[serde(default)]
    pub ciphers: Option<Value>,
    #[serde(default)]
    pub interactive_terminal_mode: Option<Value>,
    #[serde(default)]
    pub insecure: Option<Value>,
    #[serde(default)]
    pub proxy: Option<Value>,
    #[serde(default)]
    pub host_key_fingerprints: Option<Value>,
}

impl IntegrationParams {
    /// Load parameters from `REMOTE_ACCESS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load parameters through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(Value::String)
        };
        Self {
            credentials: PlatformCredentials {
                identifier: lookup(USERNAME_ENV_VAR),
                password: lookup(PASSWORD_ENV_VAR),
                key_path: lookup(KEY_PATH_ENV_VAR),
                passphrase: lookup(KEY_PASSPHRASE_ENV_VAR),
            },
            hostname: lookup(HOSTNAME_ENV_VAR).unwrap_or_default(),
            port: value(PORT_ENV_VAR),
            ciphers: value(CIPHERS_ENV_VAR),
            interactive_terminal_mode: value(INTERACTIVE_TERMINAL_ENV_VAR),
            insecure: value(INSECURE_ENV_VAR),
            proxy: value(PROXY_ENV_VAR),
            host_key_fingerprints: value(HOST_KEY_FINGERPRINTS_ENV_VAR),
        }
    }

    /// Parse the platform parameter mapping from JSON.
    pub fn from_json(json: &str) -> Result<Self, RunnerError> {
        serde_json::from_str(json)
            .map_err(|e| RunnerError::invalid_input(format!("malformed parameters: {}", e)))
    }

    /// Convert into validated [`ConnectionParameters`].
    pub fn to_connection_parameters(&self) -> Result<ConnectionParameters, RunnerError> {
        let username = self.credentials.identifier.clone().unwrap_or_default();
        let mut builder = ConnectionParameters::builder(self.hostname.clone(), username)
            .port(arg_to_port(self.port.as_ref())?)
            .ciphers(arg_to_list(self.ciphers.as_ref()))
            .interactive_terminal(arg_to_bool(
                self.interactive_terminal_mode.as_ref(),
                "interactive_terminal_mode",
            )?)
            .verify_certificate(!arg_to_bool(self.insecure.as_ref(), "insecure")?)
            .use_proxy(arg_to_bool(self.proxy.as_ref(), "proxy")?);

        let passphrase = non_empty(self.credentials.passphrase.as_deref()).map(str::to_string);
        if let Some(password) = non_empty(self.credentials.password.as_deref()) {
            builder = builder.password(password);
        }
        if let Some(key_path) = non_empty(self.credentials.key_path.as_deref()) {
            builder = builder.key_file(key_path, passphrase);
        }

        let pinned = arg_to_list(self.host_key_fingerprints.as_ref());
        if !pinned.is_empty() {
            builder = builder.host_key_policy(HostKeyPolicy::Pinned(pinned));
        }

        builder.build()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Split a list argument: arrays pass through, strings split on commas.
///
/// Entries are trimmed and empty entries dropped.
pub(crate) fn arg_to_list(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(other) => vec![other.to_string()],
    };

    raw.into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Interpret a boolean argument. Missing values are `false`; an empty
/// string is not a boolean.
pub(crate) fn arg_to_bool(value: Option<&Value>, name: &str) -> Result<bool, RunnerError> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "false" | "no" => Ok(false),
            "true" | "yes" => Ok(true),
            _ => Err(RunnerError::invalid_input(format!(
                "argument {} does not contain a valid boolean-like value: {}",
                name, s
            ))),
        },
        Some(other) => Err(RunnerError::invalid_input(format!(
            "argument {} does not contain a valid boolean-like value: {}",
            name, other
        ))),
    }
}

/// Interpret a port argument. Missing or empty values yield port 22.
pub(crate) fn arg_to_port(value: Option<&Value>) -> Result<u16, RunnerError> {
    match value {
        None | Some(Value::Null) => Ok(DEFAULT_SSH_PORT),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(DEFAULT_SSH_PORT),
        Some(Value::String(s)) => parse_port(s).map_err(RunnerError::InvalidInput),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| RunnerError::invalid_input(format!("Invalid port number: {}", n))),
        Some(other) => Err(RunnerError::invalid_input(format!(
            "Invalid port number: {}",
            other
        ))),
    }
}
