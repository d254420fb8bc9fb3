// File: paintbot-core/src/store/mod.rs
//
// The configuration store: tracked channels plus secrets, held in memory
// and rewritten to disk after every mutation.

pub mod persist;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

use crate::Error;
use paintbot_common::models::{Secrets, StoreDocument, TrackedChannel, WebhookSettings};

/// Twitch only accepts webhook secrets of this length.
const SECRET_LEN: std::ops::RangeInclusive<usize> = 10..=100;

/// A tracked channel and its exclusive critical section.
///
/// Every read-modify-write of a channel happens while holding its lock, and
/// the matching [`ConfigStore::commit`] happens before the lock is released.
#[derive(Clone)]
pub struct ChannelHandle {
    index: usize,
    cell: Arc<Mutex<TrackedChannel>>,
}

impl ChannelHandle {
    pub async fn lock(&self) -> MutexGuard<'_, TrackedChannel> {
        self.cell.lock().await
    }
}

pub struct ConfigStore {
    path: PathBuf,
    /// Secrets and webhook settings as they appear in the file. Written back
    /// unchanged.
    file_secrets: Secrets,
    secrets: Secrets,
    file_webhook: WebhookSettings,
    webhook: WebhookSettings,
    handles: Vec<ChannelHandle>,
    index: HashMap<String, usize>,
    /// Last committed state of every channel, in configuration order.
    committed: parking_lot::Mutex<Vec<TrackedChannel>>,
    /// Serializes file writes.
    write_lock: Mutex<()>,
}

impl ConfigStore {
    /// Loads and validates the document at `path`, applying environment
    /// overrides to the secrets.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let doc = persist::load_document(path)?;
        info!("[Store] loaded {} tracked channel(s) from {}", doc.channels.len(), path.display());
        Self::from_document(path, doc, |k| std::env::var(k).ok())
    }

    pub fn from_document(
        path: impl Into<PathBuf>,
        doc: StoreDocument,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        validate(&doc)?;

        let secrets = doc.secrets.with_overrides(&env);
        let mut webhook = doc.webhook.clone();
        if let Some(secret) = env("PAINTBOT_WEBHOOK_SECRET").filter(|s| !s.trim().is_empty()) {
            if !SECRET_LEN.contains(&secret.len()) {
                return Err(Error::Config("PAINTBOT_WEBHOOK_SECRET must be 10-100 characters".into()));
            }
            webhook.secret = secret;
        }

        let mut index = HashMap::new();
        let handles = doc
            .channels
            .iter()
            .enumerate()
            .map(|(i, ch)| {
                index.insert(ch.key(), i);
                ChannelHandle {
                    index: i,
                    cell: Arc::new(Mutex::new(ch.clone())),
                }
            })
            .collect();

        Ok(Self {
            path: path.into(),
            file_secrets: doc.secrets,
            secrets,
            file_webhook: doc.webhook,
            webhook,
            handles,
            index,
            committed: parking_lot::Mutex::new(doc.channels),
            write_lock: Mutex::new(()),
        })
    }

    /// Effective secrets, environment overrides included.
    pub fn secrets(&self) -> &Secrets {
        &self.secrets
    }

    pub fn webhook(&self) -> &WebhookSettings {
        &self.webhook
    }

    /// Case-insensitive lookup by stream name.
    pub fn lookup(&self, stream_name: &str) -> Option<ChannelHandle> {
        self.index
            .get(&stream_name.to_ascii_lowercase())
            .map(|&i| self.handles[i].clone())
    }

    pub fn handles(&self) -> impl Iterator<Item = &ChannelHandle> {
        self.handles.iter()
    }

    pub fn channel_count(&self) -> usize {
        self.handles.len()
    }

    /// Last committed state of every channel.
    pub fn snapshot(&self) -> Vec<TrackedChannel> {
        self.committed.lock().clone()
    }

    pub fn document(&self) -> StoreDocument {
        StoreDocument {
            secrets: self.file_secrets.clone(),
            webhook: self.file_webhook.clone(),
            channels: self.snapshot(),
        }
    }

    /// Records `channel` as the committed state of `handle` and rewrites
    /// the whole document. Call while holding the channel's lock.
    pub async fn commit(&self, handle: &ChannelHandle, channel: &TrackedChannel) -> Result<(), Error> {
        {
            let mut committed = self.committed.lock();
            match committed.get_mut(handle.index) {
                Some(slot) => *slot = channel.clone(),
                None => return Err(Error::NotFound(format!("channel slot {}", handle.index))),
            }
        }
        self.persist().await
    }

    /// Writes the committed state to disk.
    pub async fn persist(&self) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        let doc = self.document();
        let path = self.path.clone();

        let result = tokio::task::spawn_blocking(move || persist::save_document(&path, &doc))
            .await
            .map_err(|e| Error::Platform(format!("persist task failed: {e}")))?;

        match &result {
            Ok(()) => debug!("[Store] persisted {}", self.path.display()),
            Err(e) => error!("[Store] failed to persist {}: {}", self.path.display(), e),
        }
        result
    }
}

fn validate(doc: &StoreDocument) -> Result<(), Error> {
    if doc.channels.is_empty() {
        return Err(Error::Config("no channels configured".into()));
    }

    let mut seen = HashMap::new();
    for ch in &doc.channels {
        if ch.stream_name.trim().is_empty() {
            return Err(Error::Config("channel with empty stream_name".into()));
        }
        if seen.insert(ch.key(), ()).is_some() {
            return Err(Error::Config(format!("duplicate stream_name '{}'", ch.stream_name)));
        }
        if ch.destinations.is_empty() {
            return Err(Error::Config(format!("'{}' has no destinations", ch.stream_name)));
        }
    }

    if !SECRET_LEN.contains(&doc.webhook.secret.len()) {
        return Err(Error::Config("webhook secret must be 10-100 characters".into()));
    }

    let callback = url::Url::parse(&doc.webhook.callback_url)
        .map_err(|e| Error::Config(format!("bad callback_url: {e}")))?;
    if callback.scheme() != "https" {
        return Err(Error::Config("callback_url must use https".into()));
    }

    doc.webhook
        .listen_addr
        .parse::<SocketAddr>()
        .map_err(|e| Error::Config(format!("bad listen_addr '{}': {}", doc.webhook.listen_addr, e)))?;

    Ok(())
}
