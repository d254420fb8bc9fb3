use serde::{Deserialize, Serialize};

/// One chat location a tracked stream is announced in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub channel_id: String,
    /// Empty until a message has been sent here.
    #[serde(default)]
    pub last_message_id: String,
}

impl Destination {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            last_message_id: String::new(),
        }
    }

    pub fn has_message(&self) -> bool {
        !self.last_message_id.is_empty()
    }
}

/// Destinations in persisted configuration order. Iteration always follows
/// that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Destinations(Vec<Destination>);

impl Destinations {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Destination> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Destination> {
        self.0.iter_mut()
    }
}

impl<'a> IntoIterator for &'a Destinations {
    type Item = &'a Destination;
    type IntoIter = std::slice::Iter<'a, Destination>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Destination>> for Destinations {
    fn from(items: Vec<Destination>) -> Self {
        Self(items)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveState {
    Offline,
    Live,
}

/// A configured stream, matched against inbound events by `stream_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedChannel {
    pub stream_name: String,
    #[serde(default)]
    pub provider_user_id: String,
    pub destinations: Destinations,
    #[serde(default = "default_highlight_color")]
    pub highlight_color: u32,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Hot pink.
pub fn default_highlight_color() -> u32 {
    0xff69b4
}

impl TrackedChannel {
    pub fn new(stream_name: impl Into<String>, destinations: Vec<Destination>) -> Self {
        Self {
            stream_name: stream_name.into(),
            provider_user_id: String::new(),
            destinations: destinations.into(),
            highlight_color: default_highlight_color(),
            is_live: false,
            title: String::new(),
            category: String::new(),
            description: None,
        }
    }

    pub fn state(&self) -> LiveState {
        if self.is_live { LiveState::Live } else { LiveState::Offline }
    }

    pub fn has_resolved_user(&self) -> bool {
        !self.provider_user_id.is_empty()
    }

    pub fn stream_url(&self) -> String {
        format!("https://www.twitch.tv/{}", self.stream_name)
    }

    /// The stream handle as used in lookup keys.
    pub fn key(&self) -> String {
        self.stream_name.to_ascii_lowercase()
    }
}
