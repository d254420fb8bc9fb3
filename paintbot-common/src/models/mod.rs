pub mod channel;
pub mod config;
pub mod credential;
pub mod eventsub;
pub mod metadata;
pub mod notification;

pub use channel::{Destination, Destinations, LiveState, TrackedChannel};
pub use config::{Secrets, StoreDocument, WebhookSettings};
pub use credential::Credential;
pub use eventsub::{EventType, ExistingSubscription, SubscriptionRecord, SubscriptionRequest};
pub use metadata::{ChannelInfo, GameInfo, StreamMetadata, UserInfo};
pub use notification::{NotificationAuthor, NotificationField, NotificationPayload};
