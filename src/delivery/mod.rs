//! Delivery to the messaging sink: trait seam, Telegram client, retry policy.

pub mod retry;
pub mod sink;
pub mod telegram;

pub use retry::{RetryDecision, RetryPolicy};
pub use sink::{MediaItem, MediaKind, MessageSink};
pub use telegram::TelegramSink;
