//! Message content classification.
//!
//! The backend stores every message body as a string that may be plain text,
//! a hosted image URL, or an inline `data:image/...;base64,` payload. The
//! string is classified once at ingestion so rendering never re-parses it.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;

static DATA_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:image/(png|jpe?g|gif|webp|bmp|svg(\+xml)?);base64,")
        .expect("data-uri pattern is valid")
});

static IMAGE_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(png|jpe?g|gif|webp|bmp|svg)(\?.*)?$").expect("extension pattern is valid")
});

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://|www\.)[^\s/$.?#].[^\s]*").expect("link pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Image,
    Text,
}

/// Decide whether a raw message body renders as an image or as text.
pub fn classify_content(content: &str) -> ContentKind {
    let lower = content.trim().to_lowercase();
    if lower.is_empty() {
        return ContentKind::Text;
    }

    if DATA_IMAGE.is_match(&lower) {
        return ContentKind::Image;
    }

    let over_http = lower.starts_with("http://") || lower.starts_with("https://");
    if over_http && IMAGE_EXTENSION.is_match(&lower) {
        return ContentKind::Image;
    }

    ContentKind::Text
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Image hosted at an http(s) URL.
    Remote(String),
    /// Image carried inside the message as a data URI, already decoded.
    Inline { mime: String, bytes: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Image(ImageRef),
}

impl MessageContent {
    pub fn from_raw(raw: String) -> Self {
        if classify_content(&raw) == ContentKind::Text {
            return Self::Text(raw);
        }

        let trimmed = raw.trim();
        if !trimmed.to_ascii_lowercase().starts_with("data:") {
            return Self::Image(ImageRef::Remote(trimmed.to_string()));
        }

        match decode_data_uri(trimmed) {
            Some((mime, bytes)) => Self::Image(ImageRef::Inline { mime, bytes }),
            None => {
                log::debug!("Data URI looked like an image but did not decode; keeping as text");
                Self::Text(raw)
            }
        }
    }

    /// One-line plain-text rendering, used by the terminal output.
    pub fn summary(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Image(ImageRef::Remote(url)) => format!("[image] {url}"),
            Self::Image(ImageRef::Inline { mime, bytes }) => {
                format!("[image {mime}, {} bytes]", bytes.len())
            }
        }
    }
}

fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let (header, payload) = uri.split_once(',')?;
    let header = header.to_ascii_lowercase();
    let mime = header
        .strip_prefix("data:")?
        .strip_suffix(";base64")?
        .to_string();
    let payload: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(payload).ok()?;
    Some((mime, bytes))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSegment {
    Plain(String),
    Link { label: String, href: String },
}

/// Split text into plain runs and clickable links.
pub fn linkify(text: &str) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for found in LINK.find_iter(text) {
        if found.start() > cursor {
            segments.push(TextSegment::Plain(text[cursor..found.start()].to_string()));
        }
        let label = found.as_str().to_string();
        let href = if label.to_ascii_lowercase().starts_with("http") {
            label.clone()
        } else {
            format!("https://{label}")
        };
        segments.push(TextSegment::Link { label, href });
        cursor = found.end();
    }

    if cursor < text.len() {
        segments.push(TextSegment::Plain(text[cursor..].to_string()));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_images_over_http_and_data_uris() {
        assert_eq!(classify_content("https://x/y.png"), ContentKind::Image);
        assert_eq!(classify_content("http://x/y.jpg?v=2"), ContentKind::Image);
        assert_eq!(
            classify_content("data:image/png;base64,AAAA"),
            ContentKind::Image
        );
        assert_eq!(
            classify_content("  HTTPS://cdn.example.com/A.JPEG  "),
            ContentKind::Image
        );
        assert_eq!(
            classify_content("data:image/svg+xml;base64,PHN2Zz4="),
            ContentKind::Image
        );
    }

    #[test]
    fn classifies_everything_else_as_text() {
        assert_eq!(classify_content("hello world"), ContentKind::Text);
        assert_eq!(classify_content("ftp://x/y.png"), ContentKind::Text);
        assert_eq!(classify_content("https://x/y.png.txt"), ContentKind::Text);
        assert_eq!(classify_content("data:text/plain;base64,AAAA"), ContentKind::Text);
        assert_eq!(classify_content(""), ContentKind::Text);
    }

    #[test]
    fn remote_images_keep_their_url() {
        let content = MessageContent::from_raw(" https://x/y.png ".to_string());
        assert_eq!(
            content,
            MessageContent::Image(ImageRef::Remote("https://x/y.png".to_string()))
        );
    }

    #[test]
    fn inline_images_are_decoded_once() {
        // "hi!" in base64
        let content = MessageContent::from_raw("data:image/PNG;base64,aGkh".to_string());
        assert_eq!(
            content,
            MessageContent::Image(ImageRef::Inline {
                mime: "image/png".to_string(),
                bytes: b"hi!".to_vec(),
            })
        );
    }

    #[test]
    fn undecodable_inline_image_falls_back_to_text() {
        let raw = "data:image/png;base64,@@@".to_string();
        assert_eq!(
            MessageContent::from_raw(raw.clone()),
            MessageContent::Text(raw)
        );
    }

    #[test]
    fn linkify_splits_links_from_text() {
        let segments = linkify("see https://example.com/a?b=1 and www.rust-lang.org now");
        assert_eq!(
            segments,
            vec![
                TextSegment::Plain("see ".to_string()),
                TextSegment::Link {
                    label: "https://example.com/a?b=1".to_string(),
                    href: "https://example.com/a?b=1".to_string(),
                },
                TextSegment::Plain(" and ".to_string()),
                TextSegment::Link {
                    label: "www.rust-lang.org".to_string(),
                    href: "https://www.rust-lang.org".to_string(),
                },
                TextSegment::Plain(" now".to_string()),
            ]
        );
    }

    #[test]
    fn linkify_without_links_is_one_plain_segment() {
        assert_eq!(
            linkify("just words"),
            vec![TextSegment::Plain("just words".to_string())]
        );
        assert!(linkify("").is_empty());
    }
}
