// File: paintbot-core/src/platforms/twitch_eventsub/events.rs

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::Error;
use paintbot_common::models::EventType;

/// Subscription metadata carried by every webhook message.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionData {
    pub id: String,
    #[serde(rename = "type")]
    pub sub_type: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub condition: serde_json::Value,
}

/// `{ "subscription": { ... }, "event": { ... } }`
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    pub subscription: SubscriptionData,
    pub event: serde_json::Value,
}

/// `{ "challenge": "...", "subscription": { ... } }`
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationEnvelope {
    pub challenge: String,
    pub subscription: SubscriptionData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevocationEnvelope {
    pub subscription: SubscriptionData,
}

/// "stream.online"
#[derive(Debug, Clone, Deserialize)]
pub struct StreamOnline {
    #[serde(default)]
    pub id: String,
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// "stream.offline"
#[derive(Debug, Clone, Deserialize)]
pub struct StreamOffline {
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
}

/// "channel.update" v2
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelUpdate {
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    pub title: String,
    #[serde(default)]
    pub language: String,
    pub category_id: String,
    #[serde(default)]
    pub category_name: String,
}

/// An inbound event, decoded once at the webhook boundary.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    StreamOnline(StreamOnline),
    StreamOffline(StreamOffline),
    ChannelUpdate(ChannelUpdate),
}

impl StreamEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            StreamEvent::StreamOnline(_) => EventType::StreamOnline,
            StreamEvent::StreamOffline(_) => EventType::StreamOffline,
            StreamEvent::ChannelUpdate(_) => EventType::ChannelUpdate,
        }
    }

    pub fn broadcaster_name(&self) -> &str {
        match self {
            StreamEvent::StreamOnline(e) => &e.broadcaster_user_name,
            StreamEvent::StreamOffline(e) => &e.broadcaster_user_name,
            StreamEvent::ChannelUpdate(e) => &e.broadcaster_user_name,
        }
    }

    pub fn broadcaster_login(&self) -> &str {
        match self {
            StreamEvent::StreamOnline(e) => &e.broadcaster_user_login,
            StreamEvent::StreamOffline(e) => &e.broadcaster_user_login,
            StreamEvent::ChannelUpdate(e) => &e.broadcaster_user_login,
        }
    }

    pub fn broadcaster_id(&self) -> &str {
        match self {
            StreamEvent::StreamOnline(e) => &e.broadcaster_user_id,
            StreamEvent::StreamOffline(e) => &e.broadcaster_user_id,
            StreamEvent::ChannelUpdate(e) => &e.broadcaster_user_id,
        }
    }
}

/// Decodes the `event` object for `sub_type`. `Ok(None)` for types this bot
/// does not subscribe to; `Err` when a known type is malformed.
pub fn parse_notification(
    sub_type: &str,
    event_json: &serde_json::Value,
) -> Result<Option<StreamEvent>, Error> {
    let Some(kind) = EventType::parse(sub_type) else {
        return Ok(None);
    };

    let event = match kind {
        EventType::StreamOnline => {
            StreamEvent::StreamOnline(serde_json::from_value(event_json.clone())?)
        }
        EventType::StreamOffline => {
            StreamEvent::StreamOffline(serde_json::from_value(event_json.clone())?)
        }
        EventType::ChannelUpdate => {
            StreamEvent::ChannelUpdate(serde_json::from_value(event_json.clone())?)
        }
    };
    Ok(Some(event))
}
