//! Collaborator seams of the notification engine. The core only talks to
//! the streaming provider and the chat platform through these.

use async_trait::async_trait;

use crate::error::Error;
use crate::models::{
    ChannelInfo, Credential, ExistingSubscription, GameInfo, NotificationPayload,
    SubscriptionRequest, UserInfo,
};

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetches a fresh client-credentials token.
    async fn acquire(&self) -> Result<Credential, Error>;

    /// Lightweight authenticated check. `Ok(false)` means the provider
    /// rejected the credential.
    async fn validate(&self, credential: &Credential) -> Result<bool, Error>;
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn resolve_user(&self, login: &str) -> Result<UserInfo, Error>;
    async fn resolve_channel(&self, broadcaster_id: &str) -> Result<ChannelInfo, Error>;
    async fn resolve_game(&self, game_id: &str) -> Result<GameInfo, Error>;
}

#[async_trait]
pub trait SubscriptionTransport: Send + Sync {
    /// Submits one subscription and returns the provider's subscription id.
    async fn register(&self, request: &SubscriptionRequest) -> Result<String, Error>;
    async fn list(&self) -> Result<Vec<ExistingSubscription>, Error>;
    async fn delete(&self, subscription_id: &str) -> Result<(), Error>;
}

#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Posts a new message and returns its id.
    async fn send(&self, destination: &str, payload: &NotificationPayload) -> Result<String, Error>;

    /// Edits an existing message in place and returns its id.
    async fn edit(
        &self,
        destination: &str,
        message_id: &str,
        payload: &NotificationPayload,
    ) -> Result<String, Error>;
}
