// ========================================================
// File: paintbot-core/src/platforms/twitch/requests/channel.rs
// ========================================================
use serde::Deserialize;

use crate::Error;
use crate::platforms::twitch::client::TwitchHelixClient;
use paintbot_common::models::ChannelInfo;

use super::DataResponse;

/// Single record from "Get Channel Information".
#[derive(Debug, Deserialize)]
pub struct ChannelData {
    pub broadcaster_id: String,
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub title: String,
}

pub async fn fetch_channel(client: &TwitchHelixClient, broadcaster_id: &str) -> Result<ChannelInfo, Error> {
    let url = client.url(&format!(
        "channels?broadcaster_id={}",
        urlencoding::encode(broadcaster_id)
    ));
    let req = client.authorized(client.http_client().get(&url)).await?;
    let resp = req
        .send()
        .await
        .map_err(|e| Error::Platform(format!("fetch_channel network error: {e}")))?;
    let resp = TwitchHelixClient::check(resp, "fetch_channel").await?;

    let body: DataResponse<ChannelData> = resp
        .json()
        .await
        .map_err(|e| Error::Platform(format!("fetch_channel parse error: {e}")))?;

    body.data
        .into_iter()
        .next()
        .map(|c| ChannelInfo {
            title: c.title,
            category_id: c.game_id,
        })
        .ok_or_else(|| Error::NotFound(format!("Twitch channel {broadcaster_id}")))
}
