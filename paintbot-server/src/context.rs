//! paintbot-server/src/context.rs
//!
//! Builds every long-lived component once and hands out shared references.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use paintbot_core::Error;
use paintbot_core::auth::TokenManager;
use paintbot_core::platforms::discord::DiscordSink;
use paintbot_core::platforms::twitch::{TwitchAppAuthenticator, TwitchHelixClient};
use paintbot_core::services::{EventReconciler, NotificationRenderer, SubscriptionRegistrar};
use paintbot_core::store::ConfigStore;

use crate::Args;

pub struct ServerContext {
    pub store: Arc<ConfigStore>,
    pub reconciler: Arc<EventReconciler>,
    pub registrar: SubscriptionRegistrar,
    pub listen_addr: SocketAddr,
}

impl ServerContext {
    /// Loads the store and acquires the first app token. Both failures are
    /// fatal.
    pub async fn new(args: &Args) -> Result<Self, Error> {
        let store = Arc::new(ConfigStore::load(&args.config)?);
        let secrets = store.secrets().clone();
        for (name, value) in [
            ("discord_token", &secrets.discord_token),
            ("twitch_client_id", &secrets.twitch_client_id),
            ("twitch_client_secret", &secrets.twitch_client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("secrets.{name} is not set")));
            }
        }

        let listen = args.listen.as_deref().unwrap_or(&store.webhook().listen_addr);
        let listen_addr: SocketAddr = listen.parse()?;

        let timeout = Duration::from_secs(args.timeout_secs.max(1));
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        let authenticator = TwitchAppAuthenticator::new(
            http.clone(),
            &secrets.twitch_client_id,
            &secrets.twitch_client_secret,
        );
        let tokens = Arc::new(TokenManager::new(Arc::new(authenticator)).with_call_timeout(timeout));
        tokens.acquire_initial().await?;
        info!("Acquired Twitch app token.");

        let helix = Arc::new(TwitchHelixClient::new(http, &secrets.twitch_client_id, tokens.clone()));
        let chat = Arc::new(DiscordSink::new(secrets.discord_token.clone(), timeout));

        let renderer = NotificationRenderer::new(store.clone(), chat, helix.clone())
            .with_call_timeout(timeout);
        let reconciler = Arc::new(
            EventReconciler::new(store.clone(), renderer, helix.clone()).with_call_timeout(timeout),
        );
        let registrar = SubscriptionRegistrar::new(store.clone(), helix.clone(), helix.clone())
            .with_call_timeout(timeout);

        Ok(Self {
            store,
            reconciler,
            registrar,
            listen_addr,
        })
    }
}
