// ── Device capability seam ──
//
// The supervisor talks to the mower only through `DeviceApi`. Production
// code uses `CloudDevice` (backed by `AmcClient`); tests plug in fakes.

use async_trait::async_trait;
use mowctl_api::{AmcClient, AuthToken, Error, MowerSummary};
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::error::CoreError;
use crate::model::{Command, DeviceSnapshot};

/// Callback invoked with every freshly issued session token.
pub type TokenSink = Box<dyn Fn(&AuthToken) + Send + Sync>;

/// The four operations the supervisor needs from the device cloud.
///
/// Implementations own their session: `login` establishes it and the other
/// calls use it implicitly. Errors keep the transport classification so the
/// loop can tell a reconnect-worthy failure (`is_recoverable`) from a bad
/// payload.
#[async_trait]
pub trait DeviceApi: Send {
    async fn login(&mut self, username: &str, password: &SecretString) -> Result<(), Error>;

    async fn fetch_status(&mut self) -> Result<DeviceSnapshot, Error>;

    async fn send_control(&mut self, command: Command) -> Result<(), Error>;

    async fn logout(&mut self) -> Result<(), Error>;
}

/// [`DeviceApi`] over the vendor cloud.
///
/// Tries a cached token before a password login, selects the configured
/// mower (by name or id, else the first one) after each login, and reports
/// new tokens through the optional [`TokenSink`].
pub struct CloudDevice {
    client: AmcClient,
    mower: Option<String>,
    cached_token: Option<AuthToken>,
    on_token: Option<TokenSink>,
}

impl CloudDevice {
    pub fn new(client: AmcClient) -> Self {
        Self {
            client,
            mower: None,
            cached_token: None,
            on_token: None,
        }
    }

    /// Restrict selection to the mower with this name or id.
    pub fn with_mower(mut self, mower: Option<String>) -> Self {
        self.mower = mower;
        self
    }

    /// Reuse a previously issued token on the first login.
    pub fn with_cached_token(mut self, token: Option<AuthToken>) -> Self {
        self.cached_token = token;
        self
    }

    pub fn on_token(mut self, sink: TokenSink) -> Self {
        self.on_token = Some(sink);
        self
    }

    /// Log in and list every mower on the account.
    ///
    /// No mower is selected, so a stale `--mower` does not get in the way.
    pub async fn mowers(&mut self, credentials: &Credentials) -> Result<Vec<MowerSummary>, CoreError> {
        if let Some(token) = self.cached_token.take() {
            self.client.set_token(token);
            match self.client.list_mowers().await {
                Ok(mowers) => return Ok(mowers),
                Err(e) if e.is_auth_expired() => {
                    debug!("cached token rejected, logging in again");
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.issue_token(&credentials.username, &credentials.password)
            .await?;
        Ok(self.client.list_mowers().await?)
    }

    /// Revoke `token` without a password login.
    pub async fn revoke(&self, token: AuthToken) -> Result<(), CoreError> {
        self.client.set_token(token);
        self.client.logout().await?;
        Ok(())
    }

    /// Password login; hands the new token to the sink.
    async fn issue_token(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let token = self.client.login(username, password).await?;
        if let Some(sink) = &self.on_token {
            sink(&token);
        }
        Ok(())
    }

    async fn login_with_password(
        &mut self,
        username: &str,
        password: &SecretString,
    ) -> Result<(), Error> {
        self.issue_token(username, password).await?;
        let mower = self.client.select_mower(self.mower.as_deref()).await?;
        info!(mower = %mower.name, id = %mower.id, "logged in");
        Ok(())
    }
}

#[async_trait]
impl DeviceApi for CloudDevice {
    async fn login(&mut self, username: &str, password: &SecretString) -> Result<(), Error> {
        if let Some(token) = self.cached_token.take() {
            self.client.set_token(token);
            match self.client.select_mower(self.mower.as_deref()).await {
                Ok(mower) => {
                    debug!(mower = %mower.name, "reusing cached token");
                    return Ok(());
                }
                Err(e) if e.is_auth_expired() => {
                    debug!("cached token rejected, logging in again");
                }
                Err(e) => return Err(e),
            }
        }
        self.login_with_password(username, password).await
    }

    async fn fetch_status(&mut self) -> Result<DeviceSnapshot, Error> {
        Ok(DeviceSnapshot::from(self.client.status().await?))
    }

    async fn send_control(&mut self, command: Command) -> Result<(), Error> {
        self.client.control(command.as_action()).await
    }

    async fn logout(&mut self) -> Result<(), Error> {
        match self.client.logout().await {
            Err(Error::NotAuthenticated) => {
                warn!("logout requested without an active session");
                Ok(())
            }
            other => other,
        }
    }
}
