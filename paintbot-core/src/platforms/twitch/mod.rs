pub mod auth;
pub mod client;
pub mod requests;

pub use auth::TwitchAppAuthenticator;
pub use client::TwitchHelixClient;
