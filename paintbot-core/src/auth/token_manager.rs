// File: paintbot-core/src/auth/token_manager.rs
//
// Holds the process-wide app access token. Every authenticated call asks
// for `current()`, which validates first and re-acquires on rejection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::Error;
use crate::services::{DEFAULT_CALL_TIMEOUT, with_timeout};
use paintbot_common::models::Credential;
use paintbot_common::traits::TokenProvider;

pub struct TokenManager {
    provider: Arc<dyn TokenProvider>,
    /// Only held to read or swap the credential, never across a network call.
    current: Mutex<Option<Credential>>,
    call_timeout: Duration,
}

impl TokenManager {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            current: Mutex::new(None),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// First acquisition at startup. No retry: a rejection here means the
    /// client id/secret are wrong.
    pub async fn acquire_initial(&self) -> Result<Credential, Error> {
        let cred = with_timeout(self.call_timeout, self.provider.acquire())
            .await
            .map_err(|e| Error::Auth(format!("initial token acquisition failed: {e}")))?;
        info!("[TwitchAuth] acquired app access token");
        *self.current.lock().await = Some(cred.clone());
        Ok(cred)
    }

    /// Returns a credential that passed validation just now.
    ///
    /// Concurrent callers validate independently. When several see the same
    /// token rejected, only the first re-acquires; the rest pick up its
    /// replacement.
    pub async fn current(&self) -> Result<Credential, Error> {
        let held = self.current.lock().await.clone();

        if let Some(cred) = &held {
            if cred.is_expired() {
                debug!("[TwitchAuth] token past its expiry - re-acquiring");
            } else {
                match with_timeout(self.call_timeout, self.provider.validate(cred)).await {
                    Ok(true) => {
                        debug!("[TwitchAuth] token still valid");
                        return Ok(cred.clone());
                    }
                    Ok(false) => warn!("[TwitchAuth] token rejected by validate endpoint - re-acquiring"),
                    Err(e) => warn!("[TwitchAuth] token validation failed ({e}) - re-acquiring"),
                }
            }
        }

        let mut guard = self.current.lock().await;
        match (guard.as_ref(), held.as_ref()) {
            (Some(now), Some(seen)) if now.secret() == seen.secret() => {}
            (Some(now), _) => {
                debug!("[TwitchAuth] token already replaced by another caller");
                return Ok(now.clone());
            }
            (None, _) => {}
        }

        let fresh = with_timeout(self.call_timeout, self.provider.acquire()).await?;
        info!("[TwitchAuth] re-acquired app access token");
        *guard = Some(fresh.clone());
        Ok(fresh)
    }
}
