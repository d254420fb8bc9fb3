// File: paintbot-core/src/services/reconciler.rs
//
// Per-channel live/offline state machine driven by inbound EventSub events.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::Error;
use crate::platforms::twitch_eventsub::StreamEvent;
use crate::services::renderer::{NotificationRenderer, RenderMode, RenderReport};
use crate::services::{DEFAULT_CALL_TIMEOUT, with_timeout};
use crate::store::{ChannelHandle, ConfigStore};
use paintbot_common::models::{LiveState, TrackedChannel};
use paintbot_common::traits::MetadataProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No tracked channel has this broadcaster's name.
    Unmatched,
    WentLive(RenderReport),
    /// Repeat online event while live. Nothing is rendered.
    AlreadyLive,
    WentOffline,
    AlreadyOffline,
    MetadataRefreshed(RenderReport),
    /// Title/category stored while offline.
    MetadataRecorded,
}

pub struct EventReconciler {
    store: Arc<ConfigStore>,
    renderer: NotificationRenderer,
    metadata: Arc<dyn MetadataProvider>,
    call_timeout: Duration,
}

impl EventReconciler {
    pub fn new(
        store: Arc<ConfigStore>,
        renderer: NotificationRenderer,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Self {
        Self {
            store,
            renderer,
            metadata,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Applies one event to its channel. The channel's lock is held from
    /// the state read until the new state is committed.
    pub async fn apply(&self, event: StreamEvent) -> Result<ReconcileOutcome, Error> {
        let Some(handle) = self.find_channel(&event) else {
            warn!(
                "[Reconciler] {} for untracked broadcaster '{}' ({}) - dropping",
                event.event_type(),
                event.broadcaster_name(),
                event.broadcaster_id()
            );
            return Ok(ReconcileOutcome::Unmatched);
        };

        let mut guard = handle.lock().await;
        let channel: &mut TrackedChannel = &mut guard;

        let outcome = match (channel.state(), event) {
            (LiveState::Live, StreamEvent::StreamOnline(_)) => {
                debug!("[Reconciler] '{}' is already live, ignoring repeat online", channel.stream_name);
                ReconcileOutcome::AlreadyLive
            }
            (LiveState::Offline, StreamEvent::StreamOnline(online)) => {
                if !channel.has_resolved_user() && !online.broadcaster_user_id.is_empty() {
                    channel.provider_user_id = online.broadcaster_user_id;
                }
                if channel.title.is_empty() || channel.category.is_empty() {
                    self.fill_channel_info(channel).await;
                }
                channel.is_live = true;
                info!("[Reconciler] '{}' went live", channel.stream_name);
                let report = self.renderer.render(&handle, channel, RenderMode::Create).await?;
                ReconcileOutcome::WentLive(report)
            }
            (LiveState::Live, StreamEvent::StreamOffline(_)) => {
                channel.is_live = false;
                info!("[Reconciler] '{}' went offline", channel.stream_name);
                self.store.commit(&handle, channel).await?;
                ReconcileOutcome::WentOffline
            }
            (LiveState::Offline, StreamEvent::StreamOffline(_)) => {
                debug!("[Reconciler] '{}' is already offline", channel.stream_name);
                self.store.commit(&handle, channel).await?;
                ReconcileOutcome::AlreadyOffline
            }
            (LiveState::Live, StreamEvent::ChannelUpdate(update)) => {
                channel.title = update.title;
                channel.category = update.category_id;
                info!("[Reconciler] '{}' updated while live, refreshing", channel.stream_name);
                let report = self.renderer.render(&handle, channel, RenderMode::Refresh).await?;
                ReconcileOutcome::MetadataRefreshed(report)
            }
            (LiveState::Offline, StreamEvent::ChannelUpdate(update)) => {
                channel.title = update.title;
                channel.category = update.category_id;
                debug!("[Reconciler] '{}' updated while offline", channel.stream_name);
                self.store.commit(&handle, channel).await?;
                ReconcileOutcome::MetadataRecorded
            }
        };

        Ok(outcome)
    }

    fn find_channel(&self, event: &StreamEvent) -> Option<ChannelHandle> {
        self.store
            .lookup(event.broadcaster_name())
            .or_else(|| self.store.lookup(event.broadcaster_login()))
    }

    /// Fills whichever of title/category is still unknown. Failures leave
    /// the fields as they were.
    async fn fill_channel_info(&self, channel: &mut TrackedChannel) {
        if !channel.has_resolved_user() {
            return;
        }
        let lookup = self.metadata.resolve_channel(&channel.provider_user_id);
        match with_timeout(self.call_timeout, lookup).await {
            Ok(info) => {
                if channel.title.is_empty() {
                    channel.title = info.title;
                }
                if channel.category.is_empty() {
                    channel.category = info.category_id;
                }
            }
            Err(e) => warn!(
                "[Reconciler] channel lookup for '{}' failed: {}",
                channel.stream_name, e
            ),
        }
    }
}
