// ========================================================
// File: paintbot-core/src/platforms/twitch/requests/game.rs
// ========================================================
use serde::Deserialize;

use crate::Error;
use crate::platforms::twitch::client::TwitchHelixClient;
use paintbot_common::models::GameInfo;

use super::DataResponse;

/// Single game record from "Get Games".
#[derive(Debug, Deserialize)]
pub struct GameData {
    pub id: String,
    pub name: String,
    pub box_art_url: String,
}

pub async fn fetch_game(client: &TwitchHelixClient, game_id: &str) -> Result<GameInfo, Error> {
    let url = client.url(&format!("games?id={}", urlencoding::encode(game_id)));
    let req = client.authorized(client.http_client().get(&url)).await?;
    let resp = req
        .send()
        .await
        .map_err(|e| Error::Platform(format!("fetch_game network error: {e}")))?;
    let resp = TwitchHelixClient::check(resp, "fetch_game").await?;

    let body: DataResponse<GameData> = resp
        .json()
        .await
        .map_err(|e| Error::Platform(format!("fetch_game parse error: {e}")))?;

    body.data
        .into_iter()
        .next()
        .map(|g| GameInfo {
            name: g.name,
            box_art_url: g.box_art_url,
        })
        .ok_or_else(|| Error::NotFound(format!("Twitch game {game_id}")))
}
