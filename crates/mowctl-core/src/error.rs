// ── Core error types ──
//
// Errors surfaced by mowctl-core to its consumers. The supervisor loop never
// returns these; it logs and keeps going. They come out of the one-shot
// helpers (mower listing, token revocation) and facade misuse.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the mower cloud: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Mower not found: {identifier}")]
    MowerNotFound { identifier: String },

    #[error("No mower is paired with this account")]
    NoMowers,

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<mowctl_api::Error> for CoreError {
    fn from(err: mowctl_api::Error) -> Self {
        use mowctl_api::Error as Api;
        match err {
            Api::Authentication { message } => CoreError::AuthenticationFailed { message },
            Api::NotAuthenticated => CoreError::AuthenticationFailed {
                message: "not logged in".into(),
            },
            Api::Transport(ref e) if e.is_timeout() => CoreError::Timeout { timeout_secs: 0 },
            Api::Transport(e) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
            Api::InvalidUrl(e) => CoreError::Validation {
                message: format!("invalid URL: {e}"),
            },
            Api::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            Api::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            Api::Deserialization { message, .. } => CoreError::Api {
                message: format!("unexpected response: {message}"),
                status: None,
            },
            Api::NoMowers => CoreError::NoMowers,
            Api::MowerNotFound(identifier) => CoreError::MowerNotFound { identifier },
            Api::NoMowerSelected => CoreError::Internal("no mower selected".into()),
            Api::InvalidCommand(cmd) => CoreError::Validation {
                message: format!("unknown command '{cmd}'"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;

    #[test]
    fn api_errors_map_to_domain_variants() {
        let err = CoreError::from(mowctl_api::Error::Api {
            status: 503,
            message: "down".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(503), .. }));

        let err = CoreError::from(mowctl_api::Error::MowerNotFound("Bob".into()));
        assert!(matches!(err, CoreError::MowerNotFound { ref identifier } if identifier == "Bob"));

        let err = CoreError::from(mowctl_api::Error::Authentication {
            message: "bad password".into(),
        });
        assert_eq!(err.to_string(), "Authentication failed: bad password");
    }
}
