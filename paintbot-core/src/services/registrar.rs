// File: paintbot-core/src/services/registrar.rs

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::Error;
use crate::services::{DEFAULT_CALL_TIMEOUT, with_timeout};
use crate::store::ConfigStore;
use paintbot_common::models::{EventType, ExistingSubscription, SubscriptionRecord, SubscriptionRequest};
use paintbot_common::traits::{MetadataProvider, SubscriptionTransport};

/// Result of one startup registration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub registered: Vec<SubscriptionRecord>,
    /// Healthy subscriptions left in place.
    pub kept: usize,
    /// Stale subscriptions removed before re-registering.
    pub deleted: usize,
    pub failed: usize,
}

pub struct SubscriptionRegistrar {
    store: Arc<ConfigStore>,
    metadata: Arc<dyn MetadataProvider>,
    transport: Arc<dyn SubscriptionTransport>,
    call_timeout: Duration,
}

impl SubscriptionRegistrar {
    pub fn new(
        store: Arc<ConfigStore>,
        metadata: Arc<dyn MetadataProvider>,
        transport: Arc<dyn SubscriptionTransport>,
    ) -> Self {
        Self {
            store,
            metadata,
            transport,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Resolves the provider user id of every channel that doesn't have one
    /// yet and commits it. Returns how many were resolved.
    pub async fn resolve_user_ids(&self) -> usize {
        let mut resolved = 0;
        for handle in self.store.handles() {
            let mut channel = handle.lock().await;
            if channel.has_resolved_user() {
                continue;
            }

            let lookup = self.metadata.resolve_user(&channel.stream_name);
            match with_timeout(self.call_timeout, lookup).await {
                Ok(user) if !user.id.is_empty() => {
                    info!("[Registrar] resolved '{}' => {}", channel.stream_name, user.id);
                    channel.provider_user_id = user.id;
                    if let Err(e) = self.store.commit(handle, &channel).await {
                        error!("[Registrar] could not persist id for '{}': {}", channel.stream_name, e);
                    }
                    resolved += 1;
                }
                Ok(_) => warn!("[Registrar] no such user '{}'", channel.stream_name),
                Err(e) => warn!("[Registrar] resolving '{}' failed: {}", channel.stream_name, e),
            }
        }
        resolved
    }

    /// Submits one subscription for `provider_user_id`.
    pub async fn register(
        &self,
        provider_user_id: &str,
        event_type: EventType,
    ) -> Result<SubscriptionRecord, Error> {
        let webhook = self.store.webhook();
        let request = SubscriptionRequest {
            callback_url: webhook.callback_url.clone(),
            secret: webhook.secret.clone(),
            event_type,
            condition: provider_user_id.to_string(),
        };

        let subscription_id = with_timeout(self.call_timeout, self.transport.register(&request)).await?;
        info!(
            "[Registrar] subscribed {} for {} (id={})",
            event_type, provider_user_id, subscription_id
        );
        Ok(SubscriptionRecord {
            provider_user_id: provider_user_id.to_string(),
            event_type,
            subscription_id,
        })
    }

    /// Startup pass: resolve ids, then make sure every (channel, event type)
    /// has exactly one healthy subscription pointing at our callback.
    /// Individual failures are logged and counted.
    pub async fn register_all(&self) -> RegistrationSummary {
        self.resolve_user_ids().await;

        let existing = match with_timeout(self.call_timeout, self.transport.list()).await {
            Ok(list) => {
                debug!("[Registrar] {} existing subscription(s)", list.len());
                list
            }
            Err(e) => {
                warn!("[Registrar] listing subscriptions failed, registering everything: {}", e);
                Vec::new()
            }
        };
        let callback = self.store.webhook().callback_url.clone();

        let mut summary = RegistrationSummary::default();
        for channel in self.store.snapshot() {
            if !channel.has_resolved_user() {
                warn!("[Registrar] skipping '{}' - user id unknown", channel.stream_name);
                summary.failed += EventType::ALL.len();
                continue;
            }

            for event_type in EventType::ALL {
                let (keep, stale) =
                    partition_existing(&existing, &channel.provider_user_id, event_type, &callback);

                for old in stale {
                    match with_timeout(self.call_timeout, self.transport.delete(&old.id)).await {
                        Ok(()) => {
                            debug!("[Registrar] deleted stale {} subscription {} ({})", event_type, old.id, old.status);
                            summary.deleted += 1;
                        }
                        Err(e) => warn!("[Registrar] deleting subscription {} failed: {}", old.id, e),
                    }
                }

                if let Some(kept) = keep {
                    debug!(
                        "[Registrar] keeping {} subscription {} for '{}'",
                        event_type, kept.id, channel.stream_name
                    );
                    summary.kept += 1;
                    continue;
                }

                match self.register(&channel.provider_user_id, event_type).await {
                    Ok(record) => summary.registered.push(record),
                    Err(e) => {
                        error!(
                            "[Registrar] subscribing {} for '{}' failed: {}",
                            event_type, channel.stream_name, e
                        );
                        summary.failed += 1;
                    }
                }
            }
        }

        info!(
            "[Registrar] registered={} kept={} deleted={} failed={}",
            summary.registered.len(),
            summary.kept,
            summary.deleted,
            summary.failed
        );
        summary
    }
}

/// Splits the provider's subscriptions for one (user, event type) into the
/// one worth keeping, if any, and everything else.
fn partition_existing<'a>(
    existing: &'a [ExistingSubscription],
    user_id: &str,
    event_type: EventType,
    callback: &str,
) -> (Option<&'a ExistingSubscription>, Vec<&'a ExistingSubscription>) {
    let mut keep = None;
    let mut stale = Vec::new();
    for sub in existing
        .iter()
        .filter(|s| s.broadcaster_user_id == user_id && s.event_type == event_type.as_str())
    {
        if keep.is_none() && sub.is_healthy() && sub.callback == callback {
            keep = Some(sub);
        } else {
            stale.push(sub);
        }
    }
    (keep, stale)
}
