//! Delivery-unit assembly — one post's sink-ready representation.

use crate::delivery::sink::{self, MediaItem};
use crate::source::model::{AttachmentKind, Post};
use crate::transform::text::{chunk, truncate_chars};

/// Size limits imposed by the sink.
#[derive(Debug, Clone)]
pub struct UnitLimits {
    pub max_message_len: usize,
    pub max_caption_len: usize,
    pub max_batch_len: usize,
}

impl Default for UnitLimits {
    fn default() -> Self {
        Self {
            max_message_len: sink::MAX_MESSAGE_LEN,
            max_caption_len: sink::MAX_CAPTION_LEN,
            max_batch_len: sink::MAX_BATCH_LEN,
        }
    }
}

/// Transformed, ready-to-send representation of one post.
#[derive(Debug)]
pub struct DeliveryUnit {
    /// Text chunks to send as standalone messages, each within the sink's
    /// text limit.
    pub messages: Vec<String>,
    /// Media batches, each within the sink's batch limit.
    pub batches: Vec<Vec<MediaItem>>,
    /// Rides on the first batch's first item instead of being sent as a
    /// separate text message.
    pub caption: Option<String>,
}

/// Assemble a delivery unit from a post's cleaned text and its downloaded
/// media.
///
/// The text starts with a `#<id>` header; attachments the sink cannot carry
/// as media contribute a link line instead. When media exists, the first
/// text chunk becomes the first batch's caption (truncated to the caption
/// limit) and is dropped from the standalone messages.
pub fn build_unit(
    post: &Post,
    cleaned_body: &str,
    media: Vec<MediaItem>,
    limits: &UnitLimits,
) -> DeliveryUnit {
    let mut text = format!("#{}", post.id);
    if !cleaned_body.is_empty() {
        text.push_str("\n\n");
        text.push_str(cleaned_body);
    }

    let links: Vec<String> = post
        .attachments
        .iter()
        .filter(|a| a.kind == AttachmentKind::Other)
        .map(|a| match &a.name {
            Some(name) => format!("{name}: {}", a.url),
            None => a.url.to_string(),
        })
        .collect();
    if !links.is_empty() {
        text.push_str("\n\n");
        text.push_str(&links.join("\n"));
    }

    let mut messages = chunk(&text, limits.max_message_len);

    let batches: Vec<Vec<MediaItem>> = {
        let mut batches = Vec::new();
        let mut rest = media;
        while !rest.is_empty() {
            let tail = rest.split_off(rest.len().min(limits.max_batch_len));
            batches.push(std::mem::replace(&mut rest, tail));
        }
        batches
    };

    let caption = if !batches.is_empty() && !messages.is_empty() {
        Some(truncate_chars(&messages.remove(0), limits.max_caption_len))
    } else {
        None
    };

    DeliveryUnit {
        messages,
        batches,
        caption,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::sink::MediaKind;
    use crate::source::model::Attachment;
    use url::Url;

    fn post(id: u64, attachments: Vec<Attachment>) -> Post {
        Post {
            id,
            raw_body: String::new(),
            attachments,
            parent_id: None,
        }
    }

    fn photo(n: usize) -> MediaItem {
        MediaItem {
            kind: MediaKind::Photo,
            bytes: vec![0u8; 4],
            file_name: format!("{n}.jpg"),
        }
    }

    fn other_attachment(name: Option<&str>) -> Attachment {
        Attachment {
            url: Url::parse("https://board.example/b/src/doc.pdf").unwrap(),
            kind: AttachmentKind::Other,
            name: name.map(String::from),
        }
    }

    #[test]
    fn twenty_three_images_make_three_batches() {
        let media: Vec<MediaItem> = (0..23).map(photo).collect();
        let unit = build_unit(&post(1, vec![]), "body", media, &UnitLimits::default());

        let sizes: Vec<usize> = unit.batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![10, 10, 3]);
        // Batch order is preserved.
        assert_eq!(unit.batches[0][0].file_name, "0.jpg");
        assert_eq!(unit.batches[2][2].file_name, "22.jpg");
    }

    #[test]
    fn first_chunk_becomes_caption_when_media_present() {
        let unit = build_unit(
            &post(42, vec![]),
            "hello",
            vec![photo(0)],
            &UnitLimits::default(),
        );
        assert_eq!(unit.caption.as_deref(), Some("#42\n\nhello"));
        assert!(unit.messages.is_empty());
    }

    #[test]
    fn caption_is_truncated_to_caption_limit() {
        let limits = UnitLimits::default();
        let body = "x".repeat(3000);
        let unit = build_unit(&post(1, vec![]), &body, vec![photo(0)], &limits);

        let caption = unit.caption.unwrap();
        assert_eq!(caption.chars().count(), limits.max_caption_len);
        assert!(caption.starts_with("#1\n\n"));
    }

    #[test]
    fn no_media_means_no_caption() {
        let unit = build_unit(&post(7, vec![]), "text", vec![], &UnitLimits::default());
        assert_eq!(unit.caption, None);
        assert_eq!(unit.messages, vec!["#7\n\ntext".to_string()]);
        assert!(unit.batches.is_empty());
    }

    #[test]
    fn header_only_for_empty_body() {
        let unit = build_unit(&post(9, vec![]), "", vec![], &UnitLimits::default());
        assert_eq!(unit.messages, vec!["#9".to_string()]);
    }

    #[test]
    fn non_media_attachments_become_link_lines() {
        let unit = build_unit(
            &post(5, vec![other_attachment(Some("paper.pdf")), other_attachment(None)]),
            "see attached",
            vec![],
            &UnitLimits::default(),
        );
        assert_eq!(
            unit.messages[0],
            "#5\n\nsee attached\n\npaper.pdf: https://board.example/b/src/doc.pdf\nhttps://board.example/b/src/doc.pdf"
        );
    }

    #[test]
    fn long_text_chunks_to_message_limit() {
        let limits = UnitLimits::default();
        let body = "y".repeat(9000);
        let unit = build_unit(&post(2, vec![]), &body, vec![], &limits);

        assert_eq!(unit.messages.len(), 3); // 9005 chars total
        assert!(unit
            .messages
            .iter()
            .all(|m| m.chars().count() <= limits.max_message_len));
    }
}
