// File: src/platforms/mod.rs

pub mod discord;
pub mod twitch;
pub mod twitch_eventsub;
