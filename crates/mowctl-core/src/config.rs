// ── Runtime supervisor configuration ──
//
// Credentials and loop tuning. Never touches disk; the CLI resolves a
// profile from `mowctl-config` and hands a `SupervisorConfig` in.

use std::time::Duration;

use secrecy::SecretString;

/// Default delay between two supervisor cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Shortest delay the loop accepts between cycles. Smaller values are raised
/// to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Account credentials for the identity API.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Everything needed to start a [`Supervisor`](crate::Supervisor).
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub credentials: Credentials,
    pub poll_interval: Duration,
    /// Revoke the session when the loop exits. Off when the token is cached
    /// for reuse by the next invocation.
    pub logout_on_exit: bool,
}

impl SupervisorConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            poll_interval: DEFAULT_POLL_INTERVAL,
            logout_on_exit: true,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_logout_on_exit(mut self, logout: bool) -> Self {
        self.logout_on_exit = logout;
        self
    }
}
