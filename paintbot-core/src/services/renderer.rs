// File: paintbot-core/src/services/renderer.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::Error;
use crate::services::{DEFAULT_CALL_TIMEOUT, with_timeout};
use crate::store::{ChannelHandle, ConfigStore};
use paintbot_common::models::{
    Destination, NotificationAuthor, NotificationField, NotificationPayload, StreamMetadata,
    TrackedChannel,
};
use paintbot_common::traits::{ChatSink, MetadataProvider};

pub const UNKNOWN_GAME: &str = "N/A";
pub const DEFAULT_BOX_ART_URL: &str =
    "https://static-cdn.jtvnw.net/ttv-static/404_boxart-285x380.jpg";
const PREVIEW_BASE_URL: &str = "https://static-cdn.jtvnw.net/previews-ttv";

const AVATAR_SIZE: (u32, u32) = (70, 70);
const BOX_ART_SIZE: (u32, u32) = (285, 380);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// The channel just went live: every destination gets a new message.
    Create,
    /// Already live: edit existing messages, creating where none exists.
    Refresh,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub created: usize,
    pub edited: usize,
    pub failed: usize,
}

pub struct NotificationRenderer {
    store: Arc<ConfigStore>,
    chat: Arc<dyn ChatSink>,
    metadata: Arc<dyn MetadataProvider>,
    call_timeout: Duration,
}

impl NotificationRenderer {
    pub fn new(
        store: Arc<ConfigStore>,
        chat: Arc<dyn ChatSink>,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Self {
        Self {
            store,
            chat,
            metadata,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Renders `channel` to every destination, records the resulting
    /// message ids, then commits the channel. The commit happens even when
    /// every destination failed.
    ///
    /// Must be called while holding `handle`'s lock.
    pub async fn render(
        &self,
        handle: &ChannelHandle,
        channel: &mut TrackedChannel,
        mode: RenderMode,
    ) -> Result<RenderReport, Error> {
        let metadata = self.gather_metadata(channel).await;
        let payload = build_payload(channel, &metadata);

        let mut report = RenderReport::default();
        for destination in channel.destinations.iter_mut() {
            self.deliver(&channel.stream_name, destination, &payload, mode, &mut report)
                .await;
        }

        info!(
            "[Renderer] '{}' ({:?}): created={} edited={} failed={}",
            channel.stream_name, mode, report.created, report.edited, report.failed
        );

        self.store.commit(handle, channel).await?;
        Ok(report)
    }

    async fn deliver(
        &self,
        stream_name: &str,
        destination: &mut Destination,
        payload: &NotificationPayload,
        mode: RenderMode,
        report: &mut RenderReport,
    ) {
        if mode == RenderMode::Refresh && destination.has_message() {
            let edit = self.chat.edit(&destination.channel_id, &destination.last_message_id, payload);
            match with_timeout(self.call_timeout, edit).await {
                Ok(message_id) => {
                    destination.last_message_id = message_id;
                    report.edited += 1;
                    return;
                }
                Err(e) => warn!(
                    "[Renderer] editing message {} in {} for '{}' failed, posting a new one: {}",
                    destination.last_message_id, destination.channel_id, stream_name, e
                ),
            }
        }

        let send = self.chat.send(&destination.channel_id, payload);
        match with_timeout(self.call_timeout, send).await {
            Ok(message_id) => {
                debug!("[Renderer] posted {} to {}", message_id, destination.channel_id);
                destination.last_message_id = message_id;
                report.created += 1;
            }
            Err(e) => {
                warn!(
                    "[Renderer] posting to {} for '{}' failed: {}",
                    destination.channel_id, stream_name, e
                );
                // Whatever id is left belongs to an older or deleted message.
                destination.last_message_id.clear();
                report.failed += 1;
            }
        }
    }

    /// Looks up display metadata, substituting placeholders for anything
    /// the provider can't answer.
    pub async fn gather_metadata(&self, channel: &TrackedChannel) -> StreamMetadata {
        let (display_name, avatar_url, login) =
            match with_timeout(self.call_timeout, self.metadata.resolve_user(&channel.stream_name)).await {
                Ok(user) => {
                    let avatar = (!user.avatar_url.is_empty())
                        .then(|| sized_url(&user.avatar_url, AVATAR_SIZE));
                    let login = if user.login.is_empty() { channel.key() } else { user.login };
                    let name = if user.display_name.is_empty() {
                        channel.stream_name.clone()
                    } else {
                        user.display_name
                    };
                    (name, avatar, login)
                }
                Err(e) => {
                    warn!("[Renderer] user lookup for '{}' failed: {}", channel.stream_name, e);
                    (channel.stream_name.clone(), None, channel.key())
                }
            };

        let (game_name, box_art_url) = if channel.category.is_empty() {
            (UNKNOWN_GAME.to_string(), DEFAULT_BOX_ART_URL.to_string())
        } else {
            match with_timeout(self.call_timeout, self.metadata.resolve_game(&channel.category)).await {
                Ok(game) if !game.name.is_empty() => {
                    let art = if game.box_art_url.is_empty() {
                        DEFAULT_BOX_ART_URL.to_string()
                    } else {
                        sized_url(&game.box_art_url, BOX_ART_SIZE)
                    };
                    (game.name, art)
                }
                Ok(_) => (UNKNOWN_GAME.to_string(), DEFAULT_BOX_ART_URL.to_string()),
                Err(e) => {
                    warn!("[Renderer] game lookup for {} failed: {}", channel.category, e);
                    (UNKNOWN_GAME.to_string(), DEFAULT_BOX_ART_URL.to_string())
                }
            }
        };

        StreamMetadata {
            display_name,
            avatar_url,
            game_name,
            box_art_url,
            thumbnail_url: preview_url(&login, Utc::now().timestamp()),
        }
    }
}

/// Fills the `{width}`/`{height}` placeholders Twitch leaves in image URLs.
pub fn sized_url(template: &str, (width, height): (u32, u32)) -> String {
    template
        .replace("{width}", &width.to_string())
        .replace("{height}", &height.to_string())
}

/// Live preview image, with a cache-buster so chat clients refetch it.
pub fn preview_url(login: &str, unix_secs: i64) -> String {
    format!("{PREVIEW_BASE_URL}/live_user_{login}-640x360.jpg?t={unix_secs}")
}

pub fn build_payload(channel: &TrackedChannel, metadata: &StreamMetadata) -> NotificationPayload {
    let url = channel.stream_url();
    let title = if channel.title.trim().is_empty() {
        format!("{} is live!", metadata.display_name)
    } else {
        channel.title.clone()
    };

    NotificationPayload {
        title,
        url: url.clone(),
        author: NotificationAuthor {
            name: metadata.display_name.clone(),
            url,
            icon_url: metadata.avatar_url.clone(),
        },
        color: channel.highlight_color,
        image_url: metadata.thumbnail_url.clone(),
        thumbnail_url: metadata.box_art_url.clone(),
        fields: vec![NotificationField {
            name: "Game".to_string(),
            value: metadata.game_name.clone(),
            inline: true,
        }],
        body: channel.description.clone().filter(|d| !d.trim().is_empty()),
    }
}
