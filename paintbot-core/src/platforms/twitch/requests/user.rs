// ========================================================
// File: paintbot-core/src/platforms/twitch/requests/user.rs
// ========================================================
use serde::Deserialize;
use tracing::debug;

use crate::Error;
use crate::platforms::twitch::client::TwitchHelixClient;
use paintbot_common::models::UserInfo;

use super::DataResponse;

/// Single user record from "Get Users".
#[derive(Debug, Deserialize)]
pub struct UserData {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
}

pub async fn fetch_user(client: &TwitchHelixClient, login: &str) -> Result<UserInfo, Error> {
    let url = client.url(&format!("users?login={}", urlencoding::encode(login)));
    let req = client.authorized(client.http_client().get(&url)).await?;
    let resp = req
        .send()
        .await
        .map_err(|e| Error::Platform(format!("fetch_user network error: {e}")))?;
    let resp = TwitchHelixClient::check(resp, "fetch_user").await?;

    let body: DataResponse<UserData> = resp
        .json()
        .await
        .map_err(|e| Error::Platform(format!("fetch_user parse error: {e}")))?;

    let user = body
        .data
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound(format!("Twitch user '{login}'")))?;

    debug!("Resolved Twitch user '{}' => id={}", user.login, user.id);
    Ok(UserInfo {
        id: user.id,
        login: user.login,
        display_name: user.display_name,
        avatar_url: user.profile_image_url,
    })
}
