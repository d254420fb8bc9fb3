// File: paintbot-core/tests/test_utils/helpers.rs
//
// Hand-written fakes for the collaborator traits. Each one records what it
// was asked to do so tests can assert on call order.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use paintbot_common::models::{
    ChannelInfo, EventType, ExistingSubscription, GameInfo, NotificationPayload, Secrets,
    StoreDocument, SubscriptionRequest, TrackedChannel, UserInfo, WebhookSettings,
};
use paintbot_common::traits::{ChatSink, MetadataProvider, SubscriptionTransport};
use paintbot_core::platforms::twitch_eventsub::StreamEvent;
use paintbot_core::platforms::twitch_eventsub::events::{ChannelUpdate, StreamOffline, StreamOnline};
use paintbot_core::services::{EventReconciler, NotificationRenderer};
use paintbot_core::{ConfigStore, Error};

pub const CALLBACK_URL: &str = "https://bot.example/notify";
pub const WEBHOOK_SECRET: &str = "s3cr3t-s3cr3t";

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCall {
    Send { destination: String, message_id: String },
    Edit { destination: String, message_id: String },
    FailedEdit { destination: String, message_id: String },
    FailedSend { destination: String },
}

#[derive(Default)]
pub struct RecordingChat {
    pub calls: Mutex<Vec<ChatCall>>,
    pub payloads: Mutex<Vec<NotificationPayload>>,
    next_id: AtomicU64,
    pub fail_edits: AtomicBool,
    pub fail_sends_to: Mutex<HashSet<String>>,
}

impl RecordingChat {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1000),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<ChatCall> {
        self.calls.lock().clone()
    }

    pub fn sends(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ChatCall::Send { .. }))
            .count()
    }

    pub fn edits(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ChatCall::Edit { .. }))
            .count()
    }

    fn next_message_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }
}

#[async_trait]
impl ChatSink for RecordingChat {
    async fn send(&self, destination: &str, payload: &NotificationPayload) -> Result<String, Error> {
        if self.fail_sends_to.lock().contains(destination) {
            self.calls.lock().push(ChatCall::FailedSend {
                destination: destination.to_string(),
            });
            return Err(Error::Platform(format!("send to {destination} refused")));
        }
        let id = self.next_message_id();
        self.calls.lock().push(ChatCall::Send {
            destination: destination.to_string(),
            message_id: id.clone(),
        });
        self.payloads.lock().push(payload.clone());
        Ok(id)
    }

    async fn edit(
        &self,
        destination: &str,
        message_id: &str,
        payload: &NotificationPayload,
    ) -> Result<String, Error> {
        if self.fail_edits.load(Ordering::SeqCst) {
            self.calls.lock().push(ChatCall::FailedEdit {
                destination: destination.to_string(),
                message_id: message_id.to_string(),
            });
            return Err(Error::Platform("Unknown Message".into()));
        }
        self.calls.lock().push(ChatCall::Edit {
            destination: destination.to_string(),
            message_id: message_id.to_string(),
        });
        self.payloads.lock().push(payload.clone());
        Ok(message_id.to_string())
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StaticMetadata {
    pub users: HashMap<String, UserInfo>,
    pub channels: HashMap<String, ChannelInfo>,
    pub games: HashMap<String, GameInfo>,
    pub user_lookups: AtomicUsize,
    pub channel_lookups: AtomicUsize,
}

impl StaticMetadata {
    pub fn with_user(mut self, login: &str, id: &str) -> Self {
        self.users.insert(
            login.to_ascii_lowercase(),
            UserInfo {
                id: id.to_string(),
                login: login.to_ascii_lowercase(),
                display_name: login.to_string(),
                avatar_url: format!("https://img.example/{login}-{{width}}x{{height}}.png"),
            },
        );
        self
    }

    pub fn with_channel(mut self, id: &str, title: &str, category_id: &str) -> Self {
        self.channels.insert(
            id.to_string(),
            ChannelInfo {
                title: title.to_string(),
                category_id: category_id.to_string(),
            },
        );
        self
    }

    pub fn with_game(mut self, id: &str, name: &str) -> Self {
        self.games.insert(
            id.to_string(),
            GameInfo {
                name: name.to_string(),
                box_art_url: format!("https://img.example/{id}-{{width}}x{{height}}.jpg"),
            },
        );
        self
    }
}

#[async_trait]
impl MetadataProvider for StaticMetadata {
    async fn resolve_user(&self, login: &str) -> Result<UserInfo, Error> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        self.users
            .get(&login.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("user {login}")))
    }

    async fn resolve_channel(&self, broadcaster_id: &str) -> Result<ChannelInfo, Error> {
        self.channel_lookups.fetch_add(1, Ordering::SeqCst);
        self.channels
            .get(broadcaster_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("channel {broadcaster_id}")))
    }

    async fn resolve_game(&self, game_id: &str) -> Result<GameInfo, Error> {
        self.games
            .get(game_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("game {game_id}")))
    }
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeTransport {
    pub existing: Vec<ExistingSubscription>,
    pub list_fails: bool,
    /// Registrations for these user ids are refused.
    pub refuse_users: HashSet<String>,
    pub registered: Mutex<Vec<SubscriptionRequest>>,
    pub deleted: Mutex<Vec<String>>,
    pub next_id: AtomicU64,
}

impl FakeTransport {
    pub fn registered_pairs(&self) -> Vec<(String, EventType)> {
        self.registered
            .lock()
            .iter()
            .map(|r| (r.condition.clone(), r.event_type))
            .collect()
    }
}

#[async_trait]
impl SubscriptionTransport for FakeTransport {
    async fn register(&self, request: &SubscriptionRequest) -> Result<String, Error> {
        if self.refuse_users.contains(&request.condition) {
            return Err(Error::Platform("HTTP 409 => subscription already exists".into()));
        }
        self.registered.lock().push(request.clone());
        Ok(format!("sub-{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn list(&self) -> Result<Vec<ExistingSubscription>, Error> {
        if self.list_fails {
            return Err(Error::Platform("HTTP 500".into()));
        }
        Ok(self.existing.clone())
    }

    async fn delete(&self, subscription_id: &str) -> Result<(), Error> {
        self.deleted.lock().push(subscription_id.to_string());
        Ok(())
    }
}

pub fn existing(id: &str, event_type: EventType, status: &str, user: &str, callback: &str) -> ExistingSubscription {
    ExistingSubscription {
        id: id.to_string(),
        event_type: event_type.as_str().to_string(),
        status: status.to_string(),
        broadcaster_user_id: user.to_string(),
        callback: callback.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Store + wiring
// ---------------------------------------------------------------------------

pub fn document(channels: Vec<TrackedChannel>) -> StoreDocument {
    StoreDocument {
        secrets: Secrets {
            discord_token: "discord-token".into(),
            twitch_client_id: "client-id".into(),
            twitch_client_secret: "client-secret".into(),
        },
        webhook: WebhookSettings {
            listen_addr: "127.0.0.1:0".into(),
            callback_url: CALLBACK_URL.into(),
            secret: WEBHOOK_SECRET.into(),
        },
        channels,
    }
}

pub fn test_store(path: &Path, channels: Vec<TrackedChannel>) -> Arc<ConfigStore> {
    let store = ConfigStore::from_document(path, document(channels), |_| None)
        .expect("test document is valid");
    Arc::new(store)
}

pub fn reconciler(
    store: Arc<ConfigStore>,
    chat: Arc<RecordingChat>,
    metadata: Arc<StaticMetadata>,
) -> EventReconciler {
    let renderer = NotificationRenderer::new(store.clone(), chat, metadata.clone());
    EventReconciler::new(store, renderer, metadata)
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

pub fn online(name: &str, user_id: &str) -> StreamEvent {
    StreamEvent::StreamOnline(StreamOnline {
        id: "9001".into(),
        broadcaster_user_id: user_id.into(),
        broadcaster_user_login: name.to_ascii_lowercase(),
        broadcaster_user_name: name.into(),
        r#type: "live".into(),
        started_at: None,
    })
}

pub fn offline(name: &str, user_id: &str) -> StreamEvent {
    StreamEvent::StreamOffline(StreamOffline {
        broadcaster_user_id: user_id.into(),
        broadcaster_user_login: name.to_ascii_lowercase(),
        broadcaster_user_name: name.into(),
    })
}

pub fn update(name: &str, user_id: &str, title: &str, category_id: &str) -> StreamEvent {
    StreamEvent::ChannelUpdate(ChannelUpdate {
        broadcaster_user_id: user_id.into(),
        broadcaster_user_login: name.to_ascii_lowercase(),
        broadcaster_user_name: name.into(),
        title: title.into(),
        language: "en".into(),
        category_id: category_id.into(),
        category_name: String::new(),
    })
}
