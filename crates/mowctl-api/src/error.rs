use thiserror::Error;

/// Top-level error type for the `mowctl-api` crate.
///
/// Covers every failure mode of the cloud client: authentication,
/// transport, HTTP-level API errors, payload decoding and mower selection.
/// `mowctl-core` maps these into supervisor decisions.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed or the session token was rejected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A call that needs a session was made before logging in.
    #[error("Not logged in")]
    NotAuthenticated,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success HTTP status from the cloud.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Mower selection / validation ────────────────────────────────
    /// The account has no paired mower.
    #[error("No mower found on this account")]
    NoMowers,

    /// No mower matched the requested name or id.
    #[error("Could not find a mower matching '{0}'")]
    MowerNotFound(String),

    /// A tracking call was made before a mower was selected.
    #[error("No mower selected")]
    NoMowerSelected,

    /// The control action is not one the cloud understands.
    #[error("Unknown control command: {0}")]
    InvalidCommand(String),
}

impl Error {
    /// Returns `true` if this error indicates auth has expired
    /// and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::NotAuthenticated)
    }

    /// Returns `true` if the error belongs to the HTTP/session class that
    /// a reconnect can plausibly fix.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. }
                | Self::NotAuthenticated
                | Self::Transport(_)
                | Self::Timeout { .. }
                | Self::Api { .. }
                | Self::NoMowerSelected
        )
    }
}
