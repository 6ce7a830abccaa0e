//! Domain types for source posts and the alias-tolerant feed parser.
//!
//! The feed's field names vary across source versions (`num` vs `id`,
//! `comment` vs `content`, `files` vs `attachments`, `path` vs `url`).
//! Parsing normalizes all known aliases at the ingestion boundary; an
//! unrecognized shape fails the fetch, never the process.

use serde::Deserialize;
use url::Url;

use crate::error::FetchError;

/// Immutable snapshot of one source post.
#[derive(Debug, Clone)]
pub struct Post {
    /// Stable post id, unique and non-decreasing within a sweep.
    pub id: u64,
    /// Source-formatted body text; may embed HTML markup.
    pub raw_body: String,
    /// Ordered attachments, possibly empty.
    pub attachments: Vec<Attachment>,
    /// Parent post id for threaded sources, if any.
    pub parent_id: Option<u64>,
}

/// Reference to a remote binary resource attached to a post.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub url: Url,
    pub kind: AttachmentKind,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Video,
    Other,
}

const IMAGE_SUFFIXES: &[&str] = &[".jpg", ".jpeg", ".png", ".gif"];
const VIDEO_SUFFIXES: &[&str] = &[".webm", ".mp4"];

impl AttachmentKind {
    /// Classify by URL path suffix.
    ///
    /// The server-declared content type is never consulted; this mirrors the
    /// source feed's own convention and is a known gap.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if IMAGE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            AttachmentKind::Image
        } else if VIDEO_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            AttachmentKind::Video
        } else {
            AttachmentKind::Other
        }
    }
}

// ── Raw feed shapes ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawPost {
    #[serde(default, alias = "id")]
    num: Option<serde_json::Value>,
    #[serde(default, alias = "content")]
    comment: Option<String>,
    #[serde(default, alias = "attachments")]
    files: Option<Vec<RawFile>>,
    #[serde(default, alias = "parent_id")]
    parent: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(default, alias = "url")]
    path: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Parse a feed document into posts.
///
/// Accepted top-level shapes: `{threads:[{posts:[...]}]}`, `{posts:[...]}`,
/// or a flat `[...]`. Relative attachment paths are joined against `base`
/// (the feed URL), so `/b/src/1.jpg` resolves to the feed's origin.
pub fn parse_feed(doc: &serde_json::Value, base: &Url) -> Result<Vec<Post>, FetchError> {
    let posts_value = if doc.is_array() {
        doc
    } else if let Some(posts) = doc
        .get("threads")
        .and_then(|t| t.get(0))
        .and_then(|t| t.get("posts"))
    {
        posts
    } else if let Some(posts) = doc.get("posts") {
        posts
    } else {
        return Err(FetchError::Shape(
            "expected threads[0].posts, posts, or a flat array".to_string(),
        ));
    };

    let raw_posts = posts_value
        .as_array()
        .ok_or_else(|| FetchError::Shape("posts is not an array".to_string()))?;

    raw_posts.iter().map(|v| parse_post(v, base)).collect()
}

fn parse_post(value: &serde_json::Value, base: &Url) -> Result<Post, FetchError> {
    let raw: RawPost = serde_json::from_value(value.clone())
        .map_err(|e| FetchError::Shape(format!("post object: {e}")))?;

    let id = raw
        .num
        .as_ref()
        .and_then(id_value)
        .ok_or_else(|| FetchError::Shape("post has no usable 'num' or 'id'".to_string()))?;

    let attachments = raw
        .files
        .unwrap_or_default()
        .into_iter()
        .map(|f| parse_attachment(f, base))
        .collect::<Result<Vec<_>, _>>()?;

    // `parent: 0` marks the thread opener; treat it as no parent.
    let parent_id = raw.parent.as_ref().and_then(id_value).filter(|&p| p != 0);

    Ok(Post {
        id,
        raw_body: raw.comment.unwrap_or_default(),
        attachments,
        parent_id,
    })
}

fn parse_attachment(raw: RawFile, base: &Url) -> Result<Attachment, FetchError> {
    let path = raw
        .path
        .ok_or_else(|| FetchError::Shape("attachment has no 'path' or 'url'".to_string()))?;

    let url = base
        .join(&path)
        .map_err(|e| FetchError::Shape(format!("attachment url {path:?}: {e}")))?;

    let kind = AttachmentKind::from_path(url.path());

    Ok(Attachment {
        url,
        kind,
        name: raw.name,
    })
}

/// Accept numeric ids as JSON numbers or numeric strings.
fn id_value(v: &serde_json::Value) -> Option<u64> {
    match v {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://board.example/b/res/1000.json").unwrap()
    }

    #[test]
    fn parses_threads_shape_with_num_ids() {
        let doc = serde_json::json!({
            "threads": [{
                "posts": [
                    {"num": 101, "comment": "first"},
                    {"num": "102", "comment": "second"},
                ]
            }]
        });
        let posts = parse_feed(&doc, &base()).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, 101);
        assert_eq!(posts[1].id, 102);
        assert_eq!(posts[0].raw_body, "first");
    }

    #[test]
    fn parses_flat_array_with_id_alias() {
        let doc = serde_json::json!([
            {"id": 7, "content": "aliased"},
        ]);
        let posts = parse_feed(&doc, &base()).unwrap();
        assert_eq!(posts[0].id, 7);
        assert_eq!(posts[0].raw_body, "aliased");
    }

    #[test]
    fn parses_posts_object_shape() {
        let doc = serde_json::json!({"posts": [{"num": 3}]});
        let posts = parse_feed(&doc, &base()).unwrap();
        assert_eq!(posts[0].id, 3);
        assert_eq!(posts[0].raw_body, "");
    }

    #[test]
    fn unrecognized_shape_fails_the_fetch() {
        let doc = serde_json::json!({"items": []});
        assert!(matches!(
            parse_feed(&doc, &base()),
            Err(FetchError::Shape(_))
        ));
    }

    #[test]
    fn post_without_id_fails_the_fetch() {
        let doc = serde_json::json!([{"comment": "orphan"}]);
        assert!(matches!(
            parse_feed(&doc, &base()),
            Err(FetchError::Shape(_))
        ));
    }

    #[test]
    fn relative_attachment_paths_join_against_feed_origin() {
        let doc = serde_json::json!([{
            "num": 1,
            "files": [{"path": "/b/src/123.jpg", "name": "cat.jpg"}]
        }]);
        let posts = parse_feed(&doc, &base()).unwrap();
        let att = &posts[0].attachments[0];
        assert_eq!(att.url.as_str(), "https://board.example/b/src/123.jpg");
        assert_eq!(att.kind, AttachmentKind::Image);
        assert_eq!(att.name.as_deref(), Some("cat.jpg"));
    }

    #[test]
    fn absolute_attachment_urls_pass_through() {
        let doc = serde_json::json!([{
            "num": 1,
            "attachments": [{"url": "https://cdn.example/v/clip.webm"}]
        }]);
        let posts = parse_feed(&doc, &base()).unwrap();
        let att = &posts[0].attachments[0];
        assert_eq!(att.url.as_str(), "https://cdn.example/v/clip.webm");
        assert_eq!(att.kind, AttachmentKind::Video);
    }

    #[test]
    fn kind_from_suffix_only() {
        assert_eq!(AttachmentKind::from_path("/a/b.PNG"), AttachmentKind::Image);
        assert_eq!(AttachmentKind::from_path("/a/b.mp4"), AttachmentKind::Video);
        assert_eq!(AttachmentKind::from_path("/a/b.pdf"), AttachmentKind::Other);
        assert_eq!(AttachmentKind::from_path("/a/b"), AttachmentKind::Other);
    }

    #[test]
    fn parent_zero_means_thread_opener() {
        let doc = serde_json::json!([
            {"num": 1, "parent": 0},
            {"num": 2, "parent": "1"},
        ]);
        let posts = parse_feed(&doc, &base()).unwrap();
        assert_eq!(posts[0].parent_id, None);
        assert_eq!(posts[1].parent_id, Some(1));
    }
}
