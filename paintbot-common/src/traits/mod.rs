pub mod api;

pub use api::{ChatSink, MetadataProvider, SubscriptionTransport, TokenProvider};
