//! `logout` handler: revoke the cached session token and forget it.

use chrono::Utc;
use tracing::warn;

use mowctl_config::TokenCache;
use mowctl_core::{AmcClient, CloudDevice, TransportConfig};

use crate::cli::GlobalOpts;
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

pub async fn handle(global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let (profile_name, profile) = config::active_profile(global, cfg)?;
    let empty = Profile::default();
    let endpoints = config::resolve_endpoints(global, profile.unwrap_or(&empty))?;
    let path = mowctl_config::token_path(&profile_name);

    let token = TokenCache::load(&path)?.and_then(|cache| cache.to_token(Utc::now()));
    let Some(token) = token else {
        TokenCache::clear(&path)?;
        output::print_output("No active session", global.quiet);
        return Ok(());
    };

    let client = AmcClient::new(endpoints, &TransportConfig::default())
        .map_err(|e| CliError::Internal(format!("failed to build HTTP client: {e}")))?;
    if let Err(e) = CloudDevice::new(client).revoke(token).await {
        warn!(error = %e, "token revocation failed, forgetting it anyway");
    }
    TokenCache::clear(&path)?;

    output::print_output("Logged out", global.quiet);
    Ok(())
}
