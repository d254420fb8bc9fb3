// File: paintbot-core/src/platforms/discord/sink.rs

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};
use twilight_http::Client as HttpClient;
use twilight_http::client::ClientBuilder;
use twilight_model::channel::message::Embed;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, MessageMarker};
use twilight_util::builder::embed::{EmbedAuthorBuilder, EmbedBuilder, EmbedFieldBuilder, ImageSource};

use crate::Error;
use paintbot_common::models::NotificationPayload;
use paintbot_common::traits::ChatSink;

/// Posts notification embeds over Discord's REST API. No gateway
/// connection is needed for sending or editing.
pub struct DiscordSink {
    http: HttpClient,
}

impl DiscordSink {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Self {
        let http = ClientBuilder::new()
            .token(token.into())
            .timeout(timeout)
            .build();
        Self { http }
    }
}

fn channel_id(raw: &str) -> Result<Id<ChannelMarker>, Error> {
    raw.parse::<u64>()
        .ok()
        .and_then(Id::new_checked)
        .ok_or_else(|| Error::Platform(format!("Invalid channel ID: {raw}")))
}

fn message_id(raw: &str) -> Result<Id<MessageMarker>, Error> {
    raw.parse::<u64>()
        .ok()
        .and_then(Id::new_checked)
        .ok_or_else(|| Error::Platform(format!("Invalid message ID: {raw}")))
}

fn image(url: &str) -> Result<ImageSource, Error> {
    ImageSource::url(url).map_err(|e| Error::Platform(format!("bad image url '{url}': {e}")))
}

/// Converts the platform-neutral payload into a validated embed.
pub fn build_embed(payload: &NotificationPayload) -> Result<Embed, Error> {
    let mut author = EmbedAuthorBuilder::new(payload.author.name.clone()).url(payload.author.url.clone());
    if let Some(icon) = &payload.author.icon_url {
        author = author.icon_url(image(icon)?);
    }

    let mut builder = EmbedBuilder::new()
        .title(payload.title.clone())
        .url(payload.url.clone())
        .color(payload.color)
        .author(author)
        .image(image(&payload.image_url)?)
        .thumbnail(image(&payload.thumbnail_url)?);

    if let Some(body) = &payload.body {
        builder = builder.description(body.clone());
    }
    for field in &payload.fields {
        let mut f = EmbedFieldBuilder::new(field.name.clone(), field.value.clone());
        if field.inline {
            f = f.inline();
        }
        builder = builder.field(f);
    }

    let embed = builder
        .validate()
        .map_err(|e| Error::Platform(format!("invalid embed: {e}")))?
        .build();
    Ok(embed)
}

#[async_trait]
impl ChatSink for DiscordSink {
    async fn send(&self, destination: &str, payload: &NotificationPayload) -> Result<String, Error> {
        let channel = channel_id(destination)?;
        let embed = build_embed(payload)?;

        let message = self
            .http
            .create_message(channel)
            .embeds(&[embed])
            .await
            .map_err(|e| Error::Platform(format!("Error sending Discord message: {e:?}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("Error reading Discord response: {e:?}")))?;

        debug!("[Discord] posted message {} in {}", message.id, destination);
        Ok(message.id.get().to_string())
    }

    async fn edit(
        &self,
        destination: &str,
        message: &str,
        payload: &NotificationPayload,
    ) -> Result<String, Error> {
        let channel = channel_id(destination)?;
        let message = message_id(message)?;
        let embeds = [build_embed(payload)?];

        let updated = self
            .http
            .update_message(channel, message)
            .embeds(Some(&embeds[..]))
            .await
            .map_err(|e| Error::Platform(format!("Error editing Discord message: {e:?}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("Error reading Discord response: {e:?}")))?;

        trace!("[Discord] edited message {} in {}", updated.id, destination);
        Ok(updated.id.get().to_string())
    }
}
