// File: paintbot-core/src/platforms/twitch/client.rs

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};

use crate::Error;
use crate::auth::TokenManager;
use paintbot_common::models::{
    ChannelInfo, ExistingSubscription, GameInfo, SubscriptionRequest, UserInfo,
};
use paintbot_common::traits::{MetadataProvider, SubscriptionTransport};

use super::requests;

pub const HELIX_BASE_URL: &str = "https://api.twitch.tv/helix";

/// Entry point for all Helix calls. Each request validates the app token
/// right before it is sent.
pub struct TwitchHelixClient {
    http: ReqwestClient,
    client_id: String,
    tokens: Arc<TokenManager>,
    base_url: String,
}

impl TwitchHelixClient {
    pub fn new(http: ReqwestClient, client_id: &str, tokens: Arc<TokenManager>) -> Self {
        Self {
            http,
            client_id: client_id.to_string(),
            tokens,
            base_url: HELIX_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    pub fn http_client(&self) -> &ReqwestClient {
        &self.http
    }

    /// Adds the Client-Id and a freshly validated bearer token.
    pub async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, Error> {
        let cred = self.tokens.current().await?;
        Ok(builder
            .header("Client-Id", &self.client_id)
            .header("Authorization", cred.bearer()))
    }

    /// Turns a non-2xx response into `Error::Platform` with the body attached.
    pub async fn check(resp: Response, what: &str) -> Result<Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body_text = resp.text().await.unwrap_or_default();
        Err(Error::Platform(format!("{what}: HTTP {status} => {body_text}")))
    }
}

#[async_trait]
impl MetadataProvider for TwitchHelixClient {
    async fn resolve_user(&self, login: &str) -> Result<UserInfo, Error> {
        requests::user::fetch_user(self, login).await
    }

    async fn resolve_channel(&self, broadcaster_id: &str) -> Result<ChannelInfo, Error> {
        requests::channel::fetch_channel(self, broadcaster_id).await
    }

    async fn resolve_game(&self, game_id: &str) -> Result<GameInfo, Error> {
        requests::game::fetch_game(self, game_id).await
    }
}

#[async_trait]
impl SubscriptionTransport for TwitchHelixClient {
    async fn register(&self, request: &SubscriptionRequest) -> Result<String, Error> {
        requests::eventsub::create_subscription(self, request).await
    }

    async fn list(&self) -> Result<Vec<ExistingSubscription>, Error> {
        requests::eventsub::list_subscriptions(self).await
    }

    async fn delete(&self, subscription_id: &str) -> Result<(), Error> {
        requests::eventsub::delete_subscription(self, subscription_id).await
    }
}
