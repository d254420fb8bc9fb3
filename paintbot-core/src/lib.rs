// src/lib.rs

pub mod auth;
pub mod platforms;
pub mod services;
pub mod store;

pub use paintbot_common::error::Error;
pub use store::{ChannelHandle, ConfigStore};
