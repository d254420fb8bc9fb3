use serde::{Deserialize, Serialize};
use std::fmt;

/// The EventSub subscription types a tracked channel is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "stream.online")]
    StreamOnline,
    #[serde(rename = "stream.offline")]
    StreamOffline,
    #[serde(rename = "channel.update")]
    ChannelUpdate,
}

impl EventType {
    pub const ALL: [EventType; 3] = [
        EventType::StreamOnline,
        EventType::StreamOffline,
        EventType::ChannelUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::StreamOnline => "stream.online",
            EventType::StreamOffline => "stream.offline",
            EventType::ChannelUpdate => "channel.update",
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            EventType::ChannelUpdate => "2",
            _ => "1",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    pub callback_url: String,
    pub secret: String,
    pub event_type: EventType,
    /// The broadcaster user id the subscription is conditioned on.
    pub condition: String,
}

/// What the registrar got back for one (channel, event type). Only used for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub provider_user_id: String,
    pub event_type: EventType,
    pub subscription_id: String,
}

/// A subscription as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingSubscription {
    pub id: String,
    pub event_type: String,
    pub status: String,
    pub broadcaster_user_id: String,
    pub callback: String,
}

impl ExistingSubscription {
    /// Enabled, or still waiting on the callback handshake.
    pub fn is_healthy(&self) -> bool {
        self.status == "enabled" || self.status == "webhook_callback_verification_pending"
    }
}
