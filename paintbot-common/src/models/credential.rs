use chrono::{DateTime, Utc};
use twitch_oauth2::AccessToken;

/// An app access token for the streaming provider.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: AccessToken,
    pub obtained_at: DateTime<Utc>,
    pub expires_in_secs: Option<u64>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_in_secs: Option<u64>) -> Self {
        Self {
            access_token: AccessToken::new(token.into()),
            obtained_at: Utc::now(),
            expires_in_secs,
        }
    }

    pub fn secret(&self) -> &str {
        self.access_token.secret()
    }

    /// True once the lifetime reported at acquisition has run out. Tokens
    /// with no reported lifetime never expire locally.
    pub fn is_expired(&self) -> bool {
        self.expires_in_secs.is_some_and(|secs| {
            let lived = (Utc::now() - self.obtained_at).num_seconds();
            lived >= i64::try_from(secs).unwrap_or(i64::MAX)
        })
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.secret())
    }
}
