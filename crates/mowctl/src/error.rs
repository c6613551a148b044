//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use mowctl_config::ConfigError;
use mowctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Supervision outcomes ─────────────────────────────────────────
    #[error("Mower did not complete {command} within {seconds}s")]
    #[diagnostic(
        code(mowctl::command_timeout),
        help(
            "The command stays pending in the cloud queue; check `mowctl status`.\n\
             Increase the wait with --timeout."
        )
    )]
    CommandTimedOut { command: String, seconds: u64 },

    #[error("No mower status received within {seconds}s")]
    #[diagnostic(
        code(mowctl::status_unavailable),
        help("Run with -v to see poll errors, or raise --timeout.")
    )]
    StatusUnavailable { seconds: u64 },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the mower cloud")]
    #[diagnostic(
        code(mowctl::connection_failed),
        help("Check network access to the vendor API.")
    )]
    ConnectionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(mowctl::auth_failed),
        help(
            "Verify your login and password.\n\
             Run: mowctl config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(mowctl::no_credentials),
        help(
            "Pass --login and --password, set MOWCTL_LOGIN / MOWCTL_PASSWORD,\n\
             or store them with --save."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Mower '{identifier}' not found")]
    #[diagnostic(
        code(mowctl::not_found),
        help("Run: mowctl list to see the mowers on this account")
    )]
    MowerNotFound { identifier: String },

    #[error("No mower is paired with this account")]
    #[diagnostic(code(mowctl::no_mowers))]
    NoMowers,

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(mowctl::api_error))]
    ApiError {
        message: String,
        status: Option<u16>,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(mowctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(mowctl::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(mowctl::config))]
    Config(ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(mowctl::timeout),
        help("The vendor cloud is slow to answer; try again later.")
    )]
    Timeout { seconds: u64 },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. }
            | Self::NoCredentials { .. }
            | Self::ApiError {
                status: Some(401 | 403),
                ..
            } => exit_code::AUTH,
            Self::MowerNotFound { .. } | Self::NoMowers | Self::ProfileNotFound { .. } => {
                exit_code::NOT_FOUND
            }
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoLogin { profile } | ConfigError::NoCredentials { profile } => {
                CliError::NoCredentials { profile }
            }
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed {
                source: reason.into(),
            },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::MowerNotFound { identifier } => CliError::MowerNotFound { identifier },
            CoreError::NoMowers => CliError::NoMowers,
            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Api { message, status } => CliError::ApiError { message, status },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
