//! Bounded memory of recently processed EventSub message ids.
//!
//! Twitch delivers at least once and retries with the same
//! `Twitch-Eventsub-Message-Id`, so a repeat id is acknowledged without
//! being reconciled again.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

pub const DEFAULT_CAPACITY: usize = 1024;

pub struct DeliveryDedupe {
    seen: Mutex<LruCache<String, ()>>,
}

impl DeliveryDedupe {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            seen: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Records `message_id`; returns false if it was already recorded.
    pub fn first_seen(&self, message_id: &str) -> bool {
        let mut seen = self.seen.lock();
        if seen.get(message_id).is_some() {
            return false;
        }
        seen.put(message_id.to_string(), ());
        true
    }
}

impl Default for DeliveryDedupe {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
