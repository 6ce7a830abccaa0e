//! Attachment download — turns a post's remote attachments into
//! ready-to-upload media items.

use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::delivery::sink::{MediaItem, MediaKind};
use crate::error::FetchError;
use crate::source::model::{AttachmentKind, Post};
use crate::transform::normalize_image;

/// Downloads attachment bytes with a bounded timeout.
pub struct MediaFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl MediaFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }

    /// Download and normalize a post's media attachments.
    ///
    /// Failures drop only the affected attachment (with a log line carrying
    /// the post id); the post itself is still delivered. Attachments of kind
    /// `Other` are handled as link lines during unit assembly, not here.
    pub async fn collect_media(&self, post: &Post) -> Vec<MediaItem> {
        let mut items = Vec::new();

        for attachment in &post.attachments {
            match attachment.kind {
                AttachmentKind::Other => continue,
                AttachmentKind::Image => {
                    let bytes = match self.fetch_bytes(&attachment.url).await {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            warn!(post_id = post.id, url = %attachment.url, error = %e,
                                "Attachment download failed; dropping");
                            continue;
                        }
                    };
                    // Decode/re-encode is CPU-bound; keep it off the runtime.
                    let normalized =
                        tokio::task::spawn_blocking(move || normalize_image(&bytes)).await;
                    match normalized {
                        Ok(Ok(jpeg)) => items.push(MediaItem {
                            kind: MediaKind::Photo,
                            bytes: jpeg,
                            file_name: photo_name(&attachment.url),
                        }),
                        Ok(Err(e)) => {
                            warn!(post_id = post.id, url = %attachment.url, error = %e,
                                "Image normalization failed; dropping attachment");
                        }
                        Err(e) => {
                            warn!(post_id = post.id, url = %attachment.url, error = %e,
                                "Image normalization task failed; dropping attachment");
                        }
                    }
                }
                AttachmentKind::Video => match self.fetch_bytes(&attachment.url).await {
                    Ok(bytes) => items.push(MediaItem {
                        kind: MediaKind::Video,
                        bytes,
                        file_name: segment_name(&attachment.url, "video.mp4"),
                    }),
                    Err(e) => {
                        warn!(post_id = post.id, url = %attachment.url, error = %e,
                            "Attachment download failed; dropping");
                    }
                },
            }
        }

        items
    }
}

/// Last path segment of a URL, or a fallback.
fn segment_name(url: &Url, fallback: &str) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Normalized images are always JPEG; name them accordingly.
fn photo_name(url: &Url) -> String {
    let segment = segment_name(url, "photo.jpg");
    match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}.jpg"),
        _ => segment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_name_takes_last_path_segment() {
        let url = Url::parse("https://board.example/b/src/clip.webm").unwrap();
        assert_eq!(segment_name(&url, "video.mp4"), "clip.webm");
    }

    #[test]
    fn segment_name_falls_back_for_bare_origin() {
        let url = Url::parse("https://board.example/").unwrap();
        assert_eq!(segment_name(&url, "video.mp4"), "video.mp4");
    }

    #[test]
    fn photo_name_rewrites_extension_to_jpg() {
        let url = Url::parse("https://board.example/b/src/pic.png").unwrap();
        assert_eq!(photo_name(&url), "pic.jpg");
    }
}
