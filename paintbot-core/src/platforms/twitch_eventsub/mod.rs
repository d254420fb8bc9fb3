// File: paintbot-core/src/platforms/twitch_eventsub/mod.rs

pub mod callback_server;
pub mod dedupe;
pub mod events;
pub mod signature;

pub use callback_server::{router, start_callback_server, CallbackServer, CallbackServerState};
pub use dedupe::DeliveryDedupe;
pub use events::{parse_notification, StreamEvent};
pub use signature::verify_signature;
