// File: paintbot-core/src/platforms/twitch/auth.rs

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use tracing::{debug, warn};
use twitch_oauth2::{ClientId, ClientSecret};

use crate::Error;
use paintbot_common::models::Credential;
use paintbot_common::traits::TokenProvider;

const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
const VALIDATE_URL: &str = "https://id.twitch.tv/oauth2/validate";

/// Matches Twitch's JSON from the token endpoint for the client-credentials grant.
#[derive(Deserialize)]
struct AppTokenResponse {
    access_token: String,
    expires_in: Option<u64>,
    #[allow(dead_code)]
    token_type: String,
}

/// Client-credentials flow: an app access token from client id + secret.
pub struct TwitchAppAuthenticator {
    http: ReqwestClient,
    client_id: ClientId,
    client_secret: ClientSecret,
}

impl TwitchAppAuthenticator {
    pub fn new(http: ReqwestClient, client_id: &str, client_secret: &str) -> Self {
        Self {
            http,
            client_id: ClientId::new(client_id.to_string()),
            client_secret: ClientSecret::new(client_secret.to_string()),
        }
    }
}

#[async_trait]
impl TokenProvider for TwitchAppAuthenticator {
    async fn acquire(&self) -> Result<Credential, Error> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.secret()),
            ("grant_type", "client_credentials"),
        ];

        let resp = self
            .http
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Auth(format!("HTTP error requesting app token: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Auth(format!("Twitch token endpoint => HTTP {status} => {text}")));
        }

        let token: AppTokenResponse = resp
            .json()
            .await
            .map_err(|e| Error::Auth(format!("bad token response: {e}")))?;

        debug!("[TwitchAuth] token endpoint returned expires_in={:?}", token.expires_in);
        Ok(Credential::new(token.access_token, token.expires_in))
    }

    async fn validate(&self, credential: &Credential) -> Result<bool, Error> {
        let resp = self
            .http
            .get(VALIDATE_URL)
            .header("Authorization", format!("OAuth {}", credential.secret()))
            .send()
            .await?;

        let ok = resp.status().is_success();
        if !ok {
            warn!("[TwitchAuth] validate => HTTP {}", resp.status());
        }
        Ok(ok)
    }
}
