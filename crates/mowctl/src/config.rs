//! CLI configuration: thin wrapper around `mowctl_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--login,
//! --password, --mower, ...) and builds the cloud device for a session.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use secrecy::SecretString;
use tracing::{debug, warn};

use mowctl_config::TokenCache;
use mowctl_core::{
    AmcClient, AuthToken, CloudDevice, Controller, Credentials, Endpoints, SupervisorConfig,
    TransportConfig,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use mowctl_config::{Config, Profile, config_path, load_config_or_default, save_config};

/// Poll interval used by one-shot `control`/`status` runs.
pub const ONE_SHOT_POLL: Duration = Duration::from_secs(5);

// ── Session ─────────────────────────────────────────────────────────

/// Everything resolved from flags, env, and the active profile that a
/// cloud-backed command needs.
pub struct Session {
    pub profile_name: String,
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    pub mower: Option<String>,
    pub use_token: bool,
    /// Flag or profile override; `None` leaves the choice to the command.
    pub poll_interval: Option<Duration>,
    pub http_timeout: Duration,
}

impl Session {
    pub fn token_path(&self) -> PathBuf {
        mowctl_config::token_path(&self.profile_name)
    }

    /// Build the cloud device, wired to the token cache when enabled.
    pub fn device(&self) -> Result<CloudDevice, CliError> {
        let transport = TransportConfig::default().with_timeout(self.http_timeout);
        let client = AmcClient::new(self.endpoints.clone(), &transport).map_err(|e| {
            CliError::Internal(format!("failed to build HTTP client: {e}"))
        })?;
        let device = CloudDevice::new(client).with_mower(self.mower.clone());

        if !self.use_token {
            return Ok(device);
        }

        let path = self.token_path();
        let cached = load_cached_token(&path);
        Ok(device
            .with_cached_token(cached)
            .on_token(Box::new(move |token: &AuthToken| {
                let cache = TokenCache::from_token(token, Utc::now());
                match cache.save(&path) {
                    Ok(()) => debug!(path = %path.display(), "session token cached"),
                    Err(e) => warn!(error = %e, "could not cache session token"),
                }
            })))
    }

    /// Start a supervisor for this session.
    ///
    /// With the token cache enabled the session is left open on exit so the
    /// next invocation can reuse it.
    pub fn spawn_supervisor(&self, default_poll: Duration) -> Result<Controller, CliError> {
        let config = SupervisorConfig::new(self.credentials.clone())
            .with_poll_interval(self.poll_interval.unwrap_or(default_poll))
            .with_logout_on_exit(!self.use_token);
        Ok(Controller::spawn(config, self.device()?))
    }
}

fn load_cached_token(path: &std::path::Path) -> Option<AuthToken> {
    match TokenCache::load(path) {
        Ok(Some(cache)) => cache.to_token(Utc::now()),
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "ignoring unreadable token cache");
            None
        }
    }
}

// ── Resolution ──────────────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Look up the active profile. An explicitly requested profile must exist;
/// the implicit default may be absent.
pub fn active_profile<'a>(
    global: &GlobalOpts,
    config: &'a Config,
) -> Result<(String, Option<&'a Profile>), CliError> {
    let name = active_profile_name(global, config);
    let profile = config.profiles.get(&name);
    if profile.is_none() && global.profile.is_some() {
        let mut available: Vec<_> = config.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }
    Ok((name, profile))
}

/// Cloud endpoints: hidden `--api-url` flag, then profile.
pub fn resolve_endpoints(global: &GlobalOpts, profile: &Profile) -> Result<Endpoints, CliError> {
    let Some(ref raw) = global.api_url else {
        return Ok(profile.endpoints()?);
    };
    let invalid = |reason: String| CliError::Validation {
        field: "api-url".into(),
        reason,
    };
    let base: url::Url = raw.parse().map_err(|_| invalid(format!("invalid URL: {raw}")))?;
    Endpoints::single(&base).map_err(|e| invalid(e.to_string()))
}

/// Translate flags + profile into a [`Session`].
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_session(global: &GlobalOpts, config: &Config) -> Result<Session, CliError> {
    let (profile_name, profile) = active_profile(global, config)?;
    let empty = Profile::default();
    let profile = profile.unwrap_or(&empty);

    // 1. Login (flag/env > profile)
    let username = match global.login {
        Some(ref login) => login.clone(),
        None => mowctl_config::resolve_login(profile, &profile_name)?,
    };

    // 2. Password (flag/env > keyring > plaintext)
    let password = match global.password {
        Some(ref pw) => SecretString::from(pw.clone()),
        None => mowctl_config::resolve_password(profile, &profile_name)?,
    };

    let session = Session {
        endpoints: resolve_endpoints(global, profile)?,
        mower: global.mower.clone().or_else(|| profile.mower.clone()),
        use_token: !global.no_token && profile.use_token.unwrap_or(true),
        poll_interval: global
            .poll_interval
            .or(profile.poll_interval)
            .map(Duration::from_secs),
        http_timeout: Duration::from_secs(config.defaults.http_timeout),
        credentials: Credentials { username, password },
        profile_name,
    };

    if global.save {
        save_flags(global, &session.profile_name)?;
    }

    Ok(session)
}

/// Persist `--login`/`--mower` into the profile and `--password` into the
/// keyring.
fn save_flags(global: &GlobalOpts, profile_name: &str) -> Result<(), CliError> {
    let mut cfg = load_config_or_default();
    let profile = cfg.profiles.entry(profile_name.to_owned()).or_default();
    if let Some(ref login) = global.login {
        profile.login = Some(login.clone());
    }
    if let Some(ref mower) = global.mower {
        profile.mower = Some(mower.clone());
    }
    save_config(&cfg)?;

    if let Some(ref pw) = global.password {
        if let Err(e) = mowctl_config::store_password(profile_name, &SecretString::from(pw.clone()))
        {
            warn!(error = %e, "password not saved: keyring unavailable");
        }
    }
    debug!(profile = profile_name, path = %config_path().display(), "profile saved");
    Ok(())
}
