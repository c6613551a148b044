// Mower cloud HTTP client
//
// Wraps `reqwest::Client` with bearer-token headers, mower selection and
// JSON decoding. Identity endpoints (login/logout) live in `auth.rs`;
// this module holds the transport mechanics and the tracking endpoints.

use std::sync::{PoisonError, RwLock};

use reqwest::RequestBuilder;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{AuthToken, preview};
use crate::error::Error;
use crate::models::{MowerStatusPayload, MowerSummary};
use crate::transport::TransportConfig;

const DEFAULT_IDENTITY_URL: &str = "https://iam-api.dss.husqvarnagroup.net/api/v3/";
const DEFAULT_TRACKING_URL: &str = "https://amc-api.dss.husqvarnagroup.net/v1/";

/// Actions accepted by `POST mowers/{id}/control`.
pub const CONTROL_ACTIONS: [&str; 3] = ["START", "STOP", "PARK"];

/// Base URLs of the two cloud services. Both must end with `/`.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub identity: Url,
    pub tracking: Url,
}

impl Endpoints {
    /// The vendor's public hosts.
    pub fn vendor() -> Result<Self, Error> {
        Ok(Self {
            identity: Url::parse(DEFAULT_IDENTITY_URL)?,
            tracking: Url::parse(DEFAULT_TRACKING_URL)?,
        })
    }

    /// Point both services at the same root (mock servers, proxies).
    pub fn single(base: &Url) -> Result<Self, Error> {
        Ok(Self {
            identity: base.join("api/v3/")?,
            tracking: base.join("v1/")?,
        })
    }
}


/// Raw HTTP client for the mower cloud.
///
/// Holds the session token and the id of the selected mower. All tracking
/// calls are scoped to that mower; select one with [`select_mower`](Self::select_mower)
/// after logging in.
pub struct AmcClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    token: RwLock<Option<AuthToken>>,
    mower_id: RwLock<Option<String>>,
}

impl AmcClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(endpoints: Endpoints, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, endpoints))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self {
            http,
            endpoints,
            token: RwLock::new(None),
            mower_id: RwLock::new(None),
        }
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The configured service base URLs.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    // ── Session state ─────────────────────────────────────────────────

    /// Install a token, e.g. one restored from the on-disk cache.
    pub fn set_token(&self, token: AuthToken) {
        trace!("storing session token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// The current session token, if logged in.
    pub fn token(&self) -> Option<AuthToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn take_token(&self) -> Option<AuthToken> {
        self.token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// The id of the mower tracking calls are scoped to.
    pub fn selected_mower(&self) -> Option<String> {
        self.mower_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn clear_mower(&self) {
        *self.mower_id.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn require_mower(&self) -> Result<String, Error> {
        self.selected_mower().ok_or(Error::NoMowerSelected)
    }

    /// Apply the bearer and provider headers to a request builder.
    pub(crate) fn apply_auth(&self, builder: RequestBuilder) -> Result<RequestBuilder, Error> {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        let token = guard.as_ref().ok_or(Error::NotAuthenticated)?;
        Ok(builder
            .bearer_auth(token.id.expose_secret())
            .header("Authorization-Provider", token.provider.as_str()))
    }

    // ── Tracking endpoints ───────────────────────────────────────────

    /// List the mowers paired with the account.
    pub async fn list_mowers(&self) -> Result<Vec<MowerSummary>, Error> {
        let url = self.endpoints.tracking.join("mowers")?;
        self.get_json(url).await
    }

    /// Select the mower matching `wanted` by name or id, or the first one.
    pub async fn select_mower(&self, wanted: Option<&str>) -> Result<MowerSummary, Error> {
        let mowers = self.list_mowers().await?;

        let selected = match wanted {
            Some(wanted) => mowers
                .into_iter()
                .find(|m| m.name == wanted || m.id == wanted)
                .ok_or_else(|| Error::MowerNotFound(wanted.to_owned()))?,
            None => mowers.into_iter().next().ok_or(Error::NoMowers)?,
        };

        debug!(id = %selected.id, name = %selected.name, "selected mower");
        *self.mower_id.write().unwrap_or_else(PoisonError::into_inner) = Some(selected.id.clone());
        Ok(selected)
    }

    /// Fetch the raw status of the selected mower.
    pub async fn status(&self) -> Result<MowerStatusPayload, Error> {
        let id = self.require_mower()?;
        let url = self.endpoints.tracking.join(&format!("mowers/{id}/status"))?;
        self.get_json(url).await
    }

    /// Fetch the geofence configuration of the selected mower.
    pub async fn geofence(&self) -> Result<serde_json::Value, Error> {
        let id = self.require_mower()?;
        let url = self
            .endpoints
            .tracking
            .join(&format!("mowers/{id}/geofence"))?;
        self.get_json(url).await
    }

    /// Send a control action (`START`, `STOP` or `PARK`) to the selected mower.
    pub async fn control(&self, action: &str) -> Result<(), Error> {
        if !CONTROL_ACTIONS.contains(&action) {
            return Err(Error::InvalidCommand(action.to_owned()));
        }
        let id = self.require_mower()?;
        let url = self
            .endpoints
            .tracking
            .join(&format!("mowers/{id}/control"))?;
        debug!(action, "POST {}", url);

        let builder = self.apply_auth(self.http.post(url).json(&json!({ "action": action })))?;
        let resp = builder.send().await.map_err(Error::Transport)?;
        check_status(resp).await.map(|_| ())
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let builder = self.apply_auth(self.http.get(url))?;
        let resp = builder.send().await.map_err(Error::Transport)?;
        let resp = check_status(resp).await?;

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })
    }
}

/// Map non-success statuses onto the error taxonomy.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: "session expired or invalid token".into(),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            message: preview(&body).to_owned(),
        });
    }

    Ok(resp)
}
