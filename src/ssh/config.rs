//! Runner options.
//!
//! Option values are resolved with a three-tier priority system:
//!
//! 1. **Parameter** - Explicitly provided value (highest priority)
//! 2. **Environment Variable** - Value from environment variable
//! 3. **Default** - Built-in default value (lowest priority)
//!
//! The defaults reproduce a plain single-shot run: no command timeout and no
//! connection retries.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SSH_CONNECT_TIMEOUT` | 30s | Connection timeout in seconds |
//! | `SSH_COMMAND_TIMEOUT` | none | Command execution timeout in seconds (0 = none) |
//! | `SSH_MAX_RETRIES` | 0 | Retry attempts for transient connection failures |
//! | `SSH_RETRY_DELAY_MS` | 1000ms | Initial retry delay in milliseconds |
//! | `SSH_COMPRESSION` | true | Enable zlib compression |

use std::env;
use std::time::Duration;

/// Default SSH connection timeout in seconds
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default maximum retry attempts for SSH connection
pub(crate) const DEFAULT_MAX_RETRIES: u32 = 0;

/// Default retry delay in milliseconds
pub(crate) const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Maximum delay between two connection attempts
pub(crate) const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

pub(crate) const CONNECT_TIMEOUT_ENV_VAR: &str = "SSH_CONNECT_TIMEOUT";
pub(crate) const COMMAND_TIMEOUT_ENV_VAR: &str = "SSH_COMMAND_TIMEOUT";
pub(crate) const MAX_RETRIES_ENV_VAR: &str = "SSH_MAX_RETRIES";
pub(crate) const RETRY_DELAY_MS_ENV_VAR: &str = "SSH_RETRY_DELAY_MS";
pub(crate) const COMPRESSION_ENV_VAR: &str = "SSH_COMPRESSION";

/// Tunables for a [`CommandRunner`](crate::ssh::CommandRunner).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Upper bound for TCP connect plus key exchange
    pub connect_timeout: Duration,
    /// Upper bound for the remote command; `None` waits indefinitely
    pub command_timeout: Option<Duration>,
    /// Extra connection attempts after a transient failure
    pub max_retries: u32,
    /// Initial backoff delay between connection attempts
    pub retry_delay: Duration,
    /// Offer zlib compression during negotiation
    pub compress: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            command_timeout: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            compress: true,
        }
    }
}

impl RunnerOptions {
    /// Resolve every option from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            connect_timeout: Duration::from_secs(resolve_connect_timeout(None)),
            command_timeout: resolve_command_timeout(None).map(Duration::from_secs),
            max_retries: resolve_max_retries(None),
            retry_delay: Duration::from_millis(resolve_retry_delay_ms(None)),
            compress: resolve_compression(None),
        }
    }

    /// Override the command timeout for one call.
    ///
    /// `None` keeps the current value, `Some(0)` removes the bound.
    pub fn with_command_timeout_secs(mut self, timeout_secs: Option<u64>) -> Self {
        if let Some(secs) = timeout_secs {
            self.command_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        self
    }
}

/// Resolve the connection timeout value with priority: parameter -> env var -> default
pub(crate) fn resolve_connect_timeout(timeout_param: Option<u64>) -> u64 {
    if let Some(timeout) = timeout_param {
        return timeout;
    }

    if let Ok(env_timeout) = env::var(CONNECT_TIMEOUT_ENV_VAR)
        && let Ok(timeout) = env_timeout.parse::<u64>()
    {
        return timeout;
    }

    DEFAULT_CONNECT_TIMEOUT_SECS
}

/// Resolve the command timeout with priority: parameter -> env var -> unbounded.
///
/// A value of zero from either source means "no timeout".
pub(crate) fn resolve_command_timeout(timeout_param: Option<u64>) -> Option<u64> {
    if let Some(timeout) = timeout_param {
        return (timeout > 0).then_some(timeout);
    }

    if let Ok(env_timeout) = env::var(COMMAND_TIMEOUT_ENV_VAR)
        && let Ok(timeout) = env_timeout.parse::<u64>()
    {
        return (timeout > 0).then_some(timeout);
    }

    None
}

/// Resolve the max retries value with priority: parameter -> env var -> default
pub(crate) fn resolve_max_retries(max_retries_param: Option<u32>) -> u32 {
    if let Some(max_retries) = max_retries_param {
        return max_retries;
    }

    if let Ok(env_retries) = env::var(MAX_RETRIES_ENV_VAR)
        && let Ok(retries) = env_retries.parse::<u32>()
    {
        return retries;
    }

    DEFAULT_MAX_RETRIES
}

/// Resolve the retry delay value with priority: parameter -> env var -> default
pub(crate) fn resolve_retry_delay_ms(retry_delay_param: Option<u64>) -> u64 {
    if let Some(delay) = retry_delay_param {
        return delay;
    }

    if let Ok(env_delay) = env::var(RETRY_DELAY_MS_ENV_VAR)
        && let Ok(delay) = env_delay.parse::<u64>()
    {
        return delay;
    }

    DEFAULT_RETRY_DELAY_MS
}

/// Resolve the compression setting with priority: parameter -> env var -> default (true)
pub(crate) fn resolve_compression(compress_param: Option<bool>) -> bool {
    if let Some(compress) = compress_param {
        return compress;
    }

    if let Ok(env_compress) = env::var(COMPRESSION_ENV_VAR) {
        return env_compress.eq_ignore_ascii_case("true") || env_compress == "1";
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    // Env vars are process-global, so every test touching them holds this lock.
    static ENV_TEST_MUTEX: once_cell::sync::Lazy<StdMutex<()>> =
        once_cell::sync::Lazy::new(|| StdMutex::new(()));

    /// SAFETY: Must be called while holding ENV_TEST_MUTEX.
    unsafe fn set_env(key: &str, value: &str) {
        // SAFETY: Caller ensures ENV_TEST_MUTEX is held
        unsafe { env::set_var(key, value) };
    }

    /// SAFETY: Must be called while holding ENV_TEST_MUTEX.
    unsafe fn remove_env(key: &str) {
        // SAFETY: Caller ensures ENV_TEST_MUTEX is held
        unsafe { env::remove_var(key) };
    }

    mod defaults {
        use super::*;

        #[test]
        fn test_default_options_are_single_shot() {
            let options = RunnerOptions::default();
            assert_eq!(options.connect_timeout, Duration::from_secs(30));
            assert_eq!(options.command_timeout, None);
            assert_eq!(options.max_retries, 0);
            assert_eq!(options.retry_delay, Duration::from_millis(1000));
            assert!(options.compress);
        }

        #[test]
        fn test_max_retry_delay_value() {
            assert_eq!(MAX_RETRY_DELAY, Duration::from_secs(10));
        }

        #[test]
        fn test_command_timeout_override() {
            let options = RunnerOptions::default().with_command_timeout_secs(Some(15));
            assert_eq!(options.command_timeout, Some(Duration::from_secs(15)));

            let options = options.with_command_timeout_secs(None);
            assert_eq!(options.command_timeout, Some(Duration::from_secs(15)));

            let options = options.with_command_timeout_secs(Some(0));
            assert_eq!(options.command_timeout, None);
        }
    }

    mod connect_timeout {
        use super::*;

        #[test]
        fn test_uses_param_when_provided() {
            assert_eq!(resolve_connect_timeout(Some(60)), 60);
        }

        #[test]
        fn test_uses_env_var_when_no_param() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(CONNECT_TIMEOUT_ENV_VAR, "90");
            }
            let result = resolve_connect_timeout(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(CONNECT_TIMEOUT_ENV_VAR);
            }
            assert_eq!(result, 90);
        }

        #[test]
        fn test_ignores_invalid_env_var() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(CONNECT_TIMEOUT_ENV_VAR, "-10");
            }
            let result = resolve_connect_timeout(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(CONNECT_TIMEOUT_ENV_VAR);
            }
            assert_eq!(result, DEFAULT_CONNECT_TIMEOUT_SECS);
        }
    }

    mod command_timeout {
        use super::*;

        #[test]
        fn test_param_zero_means_unbounded() {
            assert_eq!(resolve_command_timeout(Some(0)), None);
            assert_eq!(resolve_command_timeout(Some(5)), Some(5));
        }

        #[test]
        fn test_param_takes_priority_over_env() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(COMMAND_TIMEOUT_ENV_VAR, "300");
            }
            let result = resolve_command_timeout(Some(60));
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(COMMAND_TIMEOUT_ENV_VAR);
            }
            assert_eq!(result, Some(60));
        }

        #[test]
        fn test_uses_env_var_when_no_param() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(COMMAND_TIMEOUT_ENV_VAR, "240");
            }
            let result = resolve_command_timeout(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(COMMAND_TIMEOUT_ENV_VAR);
            }
            assert_eq!(result, Some(240));
        }

        #[test]
        fn test_unbounded_when_no_param_or_env() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(COMMAND_TIMEOUT_ENV_VAR);
            }
            assert_eq!(resolve_command_timeout(None), None);
        }
    }

    mod max_retries {
        use super::*;

        #[test]
        fn test_uses_param_when_provided() {
            assert_eq!(resolve_max_retries(Some(5)), 5);
        }

        #[test]
        fn test_uses_env_var_when_no_param() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(MAX_RETRIES_ENV_VAR, "7");
            }
            let result = resolve_max_retries(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(MAX_RETRIES_ENV_VAR);
            }
            assert_eq!(result, 7);
        }

        #[test]
        fn test_defaults_to_no_retries() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(MAX_RETRIES_ENV_VAR);
            }
            assert_eq!(resolve_max_retries(None), 0);
        }
    }

    mod retry_delay_ms {
        use super::*;

        #[test]
        fn test_uses_param_when_provided() {
            assert_eq!(resolve_retry_delay_ms(Some(2000)), 2000);
        }

        #[test]
        fn test_ignores_invalid_env_var() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(RETRY_DELAY_MS_ENV_VAR, "xyz");
            }
            let result = resolve_retry_delay_ms(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(RETRY_DELAY_MS_ENV_VAR);
            }
            assert_eq!(result, DEFAULT_RETRY_DELAY_MS);
        }
    }

    mod compression {
        use super::*;

        #[test]
        fn test_param_takes_priority_over_env() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(COMPRESSION_ENV_VAR, "true");
            }
            let result = resolve_compression(Some(false));
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(COMPRESSION_ENV_VAR);
            }
            assert!(!result);
        }

        #[test]
        fn test_env_var_one_and_mixed_case_true() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(COMPRESSION_ENV_VAR, "1");
            }
            let one = resolve_compression(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(COMPRESSION_ENV_VAR, "TrUe");
            }
            let mixed = resolve_compression(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(COMPRESSION_ENV_VAR);
            }
            assert!(one);
            assert!(mixed);
        }

        #[test]
        fn test_env_var_random_value_is_false() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(COMPRESSION_ENV_VAR, "yes");
            }
            let result = resolve_compression(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(COMPRESSION_ENV_VAR);
            }
            assert!(!result);
        }
    }
}
