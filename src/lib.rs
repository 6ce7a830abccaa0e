//! thread-relay — forwards new thread posts to a Telegram channel.

pub mod config;
pub mod delivery;
pub mod error;
pub mod health;
pub mod media;
pub mod relay;
pub mod source;
pub mod store;
pub mod transform;
