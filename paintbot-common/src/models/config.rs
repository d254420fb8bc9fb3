use serde::{Deserialize, Serialize};

use super::channel::TrackedChannel;

/// Credentials for the chat platform and the streaming provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub discord_token: String,
    #[serde(default)]
    pub twitch_client_id: String,
    #[serde(default)]
    pub twitch_client_secret: String,
}

impl Secrets {
    /// Returns a copy with any non-empty environment value taking precedence.
    pub fn with_overrides(&self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |key: &str, current: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| current.to_string())
        };
        Self {
            discord_token: pick("DISCORD_TOKEN", &self.discord_token),
            twitch_client_id: pick("TWITCH_CLIENT_ID", &self.twitch_client_id),
            twitch_client_secret: pick("TWITCH_CLIENT_SECRET", &self.twitch_client_secret),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookSettings {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    pub callback_url: String,
    pub secret: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:80".to_string()
}

/// The whole persisted document. Rewritten wholesale on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub secrets: Secrets,
    pub webhook: WebhookSettings,
    #[serde(default)]
    pub channels: Vec<TrackedChannel>,
}
