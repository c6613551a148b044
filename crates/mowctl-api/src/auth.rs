// Identity API authentication
//
// Token login/logout against the identity service. The returned token is
// kept by the client and sent as a bearer header on every tracking call.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::client::AmcClient;
use crate::error::Error;

/// A session token issued by the identity API.
///
/// `provider` must be echoed back in the `Authorization-Provider` header;
/// `expires_in` is relative to the moment the token was issued.
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub id: SecretString,
    pub provider: String,
    pub expires_in: Duration,
}

impl AuthToken {
    pub fn new(id: impl Into<String>, provider: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            id: SecretString::from(id.into()),
            provider: provider.into(),
            expires_in,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    data: TokenData,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    id: String,
    attributes: TokenAttributes,
}

#[derive(Debug, Deserialize, Serialize)]
struct TokenAttributes {
    provider: String,
    #[serde(default)]
    expires_in: u64,
}

impl AmcClient {
    /// Authenticate with username/password and keep the issued token.
    ///
    /// `POST {identity}token` with a JSON:API style body. The token is
    /// stored on the client and also returned so callers can cache it.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<AuthToken, Error> {
        let url = self.endpoints().identity.join("token")?;
        debug!("logging in at {}", url);

        let body = json!({
            "data": {
                "type": "token",
                "attributes": {
                    "username": username,
                    "password": password.expose_secret(),
                }
            }
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", preview(&body)),
            });
        }

        let text = resp.text().await.map_err(Error::Transport)?;
        let parsed: TokenResponse =
            serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&text)),
                body: text.clone(),
            })?;

        let token = AuthToken::new(
            parsed.data.id,
            parsed.data.attributes.provider,
            Duration::from_secs(parsed.data.attributes.expires_in),
        );
        self.set_token(token.clone());

        debug!(provider = %token.provider, "login successful");
        Ok(token)
    }

    /// Revoke the current token and forget the selected mower.
    ///
    /// `DELETE {identity}token/{id}`. The local session is cleared even when
    /// the server-side revocation fails.
    pub async fn logout(&self) -> Result<(), Error> {
        let token = self.token().ok_or(Error::NotAuthenticated)?;
        let url = self
            .endpoints()
            .identity
            .join(&format!("token/{}", token.id.expose_secret()))?;
        debug!("logging out at {}", self.endpoints().identity);

        let request = self.apply_auth(self.http().delete(url))?;
        self.take_token();
        self.clear_mower();

        let resp = request.send().await.map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: "token revocation failed".into(),
            });
        }

        debug!("logout complete");
        Ok(())
    }
}

pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
