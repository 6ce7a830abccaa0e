//! `MessageSink` trait — the sink's two send primitives.

use async_trait::async_trait;

use crate::error::SendError;

/// Maximum items per media batch accepted by the sink.
pub const MAX_BATCH_LEN: usize = 10;

/// Maximum characters per text message.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Maximum characters for a media caption.
pub const MAX_CAPTION_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

/// One ready-to-upload media file.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub bytes: Vec<u8>,
    pub file_name: String,
}

/// Seam for the orchestrator: the downstream messaging sink.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Send one text unit (caller guarantees it fits the sink limit).
    async fn send_text(&self, text: &str) -> Result<(), SendError>;

    /// Send one media batch of at most [`MAX_BATCH_LEN`] items. The caption,
    /// if present, attaches to the batch's first item.
    async fn send_media_batch(
        &self,
        items: &[MediaItem],
        caption: Option<&str>,
    ) -> Result<(), SendError>;
}
