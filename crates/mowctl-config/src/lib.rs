//! Shared configuration for the mowctl CLI and admin server.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and the on-disk session token cache. The CLI adds `GlobalOpts`-aware
//! flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mowctl_core::{AuthToken, Endpoints};

const KEYRING_SERVICE: &str = "mowctl";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no login configured for profile '{profile}'")]
    NoLogin { profile: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Seconds between supervisor polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Seconds `control`/`status` wait before giving up.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds the admin server caches `/status`.
    #[serde(default = "default_status_expire")]
    pub status_expire: u64,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,

    pub log_level: Option<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            timeout: default_timeout(),
            status_expire: default_status_expire(),
            http_timeout: default_http_timeout(),
            log_level: None,
        }
    }
}

fn default_poll_interval() -> u64 {
    10
}
fn default_timeout() -> u64 {
    60
}
fn default_status_expire() -> u64 {
    30
}
fn default_http_timeout() -> u64 {
    30
}

/// A named account profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Account e-mail used to log in.
    pub login: Option<String>,

    /// Password (plaintext, prefer keyring or `MOWCTL_PASSWORD`).
    pub password: Option<String>,

    /// Mower name or id. First mower on the account when unset.
    pub mower: Option<String>,

    /// Override the default poll interval.
    pub poll_interval: Option<u64>,

    /// Reuse the cached session token between invocations.
    pub use_token: Option<bool>,

    /// Base URL serving both the identity and tracking APIs.
    pub api_url: Option<String>,
}

impl Profile {
    /// Cloud endpoints for this profile.
    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        let invalid = |reason: String| ConfigError::Validation {
            field: "api_url".into(),
            reason,
        };
        let Some(ref raw) = self.api_url else {
            return Endpoints::vendor().map_err(|e| invalid(e.to_string()));
        };
        let base: url::Url = raw
            .parse()
            .map_err(|_| invalid(format!("invalid URL: {raw}")))?;
        Endpoints::single(&base).map_err(|e| invalid(e.to_string()))
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "mowctl", "mowctl")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("mowctl");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where the session token for `profile_name` is cached.
pub fn token_path(profile_name: &str) -> PathBuf {
    let dir = project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf());
    dir.join("tokens").join(format!("{profile_name}.toml"))
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, layered over defaults and under `MOWCTL_*` env.
///
/// Nested keys use a double underscore: `MOWCTL_DEFAULTS__POLL_INTERVAL=5`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MOWCTL_").split("__"));

    Ok(figment.extract()?)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// The account login for a profile.
pub fn resolve_login(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile.login.clone().ok_or_else(|| ConfigError::NoLogin {
        profile: profile_name.into(),
    })
}

/// Resolve the account password: env var, then keyring, then plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Ok(pw) = std::env::var("MOWCTL_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    // 2. Keyring
    if let Some(pw) = keyring_password(profile_name) {
        return Ok(SecretString::from(pw));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

fn keyring_password(profile_name: &str) -> Option<String> {
    keyring_entry(profile_name).ok()?.get_password().ok()
}

/// Store a password in the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password.expose_secret())?;
    Ok(())
}

// ── Token cache ─────────────────────────────────────────────────────

/// A session token persisted between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenCache {
    pub token: String,
    pub provider: String,
    pub expires_on: DateTime<Utc>,
}

impl TokenCache {
    /// Record `token` as issued at `issued_at`.
    pub fn from_token(token: &AuthToken, issued_at: DateTime<Utc>) -> Self {
        let lifetime = TimeDelta::from_std(token.expires_in).unwrap_or(TimeDelta::zero());
        Self {
            token: token.id.expose_secret().to_owned(),
            provider: token.provider.clone(),
            expires_on: issued_at + lifetime,
        }
    }

    /// Non-empty and not yet expired at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && self.expires_on > now
    }

    /// Rebuild an [`AuthToken`] with the lifetime remaining at `now`, or
    /// `None` if the cached token is no longer usable.
    pub fn to_token(&self, now: DateTime<Utc>) -> Option<AuthToken> {
        if !self.is_valid_at(now) {
            return None;
        }
        let remaining = (self.expires_on - now).to_std().unwrap_or(Duration::ZERO);
        Some(AuthToken::new(self.token.clone(), self.provider.clone(), remaining))
    }

    /// Read a cached token. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&raw)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Remove the cache file. Missing files are fine.
    pub fn clear(path: &Path) -> Result<(), ConfigError> {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
