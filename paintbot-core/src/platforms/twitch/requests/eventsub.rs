// ========================================================
// File: paintbot-core/src/platforms/twitch/requests/eventsub.rs
// ========================================================
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::Error;
use crate::platforms::twitch::client::TwitchHelixClient;
use paintbot_common::models::{ExistingSubscription, SubscriptionRequest};

use super::DataResponse;

/// A subscription as returned by "Create/Get EventSub Subscriptions".
#[derive(Debug, Deserialize)]
pub struct SubscriptionData {
    pub id: String,
    #[serde(rename = "type")]
    pub sub_type: String,
    pub status: String,
    #[serde(default)]
    pub condition: serde_json::Value,
    #[serde(default)]
    pub transport: serde_json::Value,
}

impl From<SubscriptionData> for ExistingSubscription {
    fn from(s: SubscriptionData) -> Self {
        let field = |v: &serde_json::Value, key: &str| {
            v.get(key).and_then(|x| x.as_str()).unwrap_or_default().to_string()
        };
        ExistingSubscription {
            broadcaster_user_id: field(&s.condition, "broadcaster_user_id"),
            callback: field(&s.transport, "callback"),
            id: s.id,
            event_type: s.sub_type,
            status: s.status,
        }
    }
}

pub fn subscription_body(request: &SubscriptionRequest) -> serde_json::Value {
    json!({
        "type": request.event_type.as_str(),
        "version": request.event_type.version(),
        "condition": { "broadcaster_user_id": request.condition },
        "transport": {
            "method": "webhook",
            "callback": request.callback_url,
            "secret": request.secret,
        }
    })
}

pub async fn create_subscription(
    client: &TwitchHelixClient,
    request: &SubscriptionRequest,
) -> Result<String, Error> {
    let url = client.url("eventsub/subscriptions");
    let body = subscription_body(request);
    debug!(
        "Subscribing to {} v{} for {}",
        request.event_type,
        request.event_type.version(),
        request.condition
    );

    let req = client.authorized(client.http_client().post(&url).json(&body)).await?;
    let resp = req
        .send()
        .await
        .map_err(|e| Error::Platform(format!("Error posting subscribe for {}: {e}", request.event_type)))?;
    let resp = TwitchHelixClient::check(resp, &format!("subscribe {}", request.event_type)).await?;

    let parsed: DataResponse<SubscriptionData> = resp
        .json()
        .await
        .map_err(|e| Error::Platform(format!("subscribe parse error: {e}")))?;

    parsed
        .data
        .into_iter()
        .next()
        .map(|s| s.id)
        .ok_or_else(|| Error::Platform("subscribe response carried no subscription".into()))
}

/// Lists every subscription owned by this app, following pagination.
pub async fn list_subscriptions(client: &TwitchHelixClient) -> Result<Vec<ExistingSubscription>, Error> {
    let mut out = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let url = match &cursor {
            Some(c) => client.url(&format!("eventsub/subscriptions?after={}", urlencoding::encode(c))),
            None => client.url("eventsub/subscriptions"),
        };
        let req = client.authorized(client.http_client().get(&url)).await?;
        let resp = req
            .send()
            .await
            .map_err(|e| Error::Platform(format!("list subscriptions network error: {e}")))?;
        let resp = TwitchHelixClient::check(resp, "list subscriptions").await?;

        let page: DataResponse<SubscriptionData> = resp
            .json()
            .await
            .map_err(|e| Error::Platform(format!("list subscriptions parse error: {e}")))?;

        out.extend(page.data.into_iter().map(ExistingSubscription::from));

        cursor = page.pagination.and_then(|p| p.cursor).filter(|c| !c.is_empty());
        if cursor.is_none() {
            break;
        }
    }

    Ok(out)
}

pub async fn delete_subscription(client: &TwitchHelixClient, subscription_id: &str) -> Result<(), Error> {
    let url = client.url(&format!(
        "eventsub/subscriptions?id={}",
        urlencoding::encode(subscription_id)
    ));
    let req = client.authorized(client.http_client().delete(&url)).await?;
    let resp = req
        .send()
        .await
        .map_err(|e| Error::Platform(format!("delete subscription network error: {e}")))?;
    TwitchHelixClient::check(resp, "delete subscription").await?;
    Ok(())
}
