//! Text normalization and chunking.

use std::sync::OnceLock;

use regex::Regex;

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#[0-9]+|#x[0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);").unwrap())
}

fn anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<a [^>]*>(.*?)</a>").unwrap())
}

fn br_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").unwrap())
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap())
}

/// Normalize source markup to plain text: decode entities, collapse links
/// to their anchor text, turn `<br>` into newlines, strip remaining tags,
/// trim surrounding whitespace.
pub fn clean_html(raw: &str) -> String {
    let decoded = decode_entities(raw);
    let no_anchors = anchor_re().replace_all(&decoded, "$1");
    let with_newlines = br_re().replace_all(&no_anchors, "\n");
    let stripped = tag_re().replace_all(&with_newlines, "");
    stripped.trim().to_string()
}

/// Decode numeric character references and the common named entities.
/// Unrecognized references are left untouched.
fn decode_entities(text: &str) -> String {
    entity_re()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Split into consecutive slices of at most `max_len` characters.
///
/// No word-boundary preservation: exactly `ceil(len/max_len)` pieces whose
/// concatenation equals the input. Counted in chars, so multi-byte text
/// never splits mid-codepoint.
pub fn chunk(text: &str, max_len: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_len)
        .map(|piece| piece.iter().collect())
        .collect()
}

/// Truncate to at most `max_len` characters.
pub fn truncate_chars(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        text.chars().take(max_len).collect()
    }
}
