//! Presentation logic for a two-party thread: ingestion, content
//! classification, day grouping and small formatting helpers.

pub mod content;
pub mod format;
pub mod grouping;
pub mod message;
pub mod transcript;

pub use content::{ContentKind, ImageRef, MessageContent, TextSegment, classify_content, linkify};
pub use format::{format_timestamp, humanize_day, initials};
pub use grouping::{DayGroup, group_by_day};
pub use message::{ConversationMessage, MessageSide, ingest, parse_timestamp};
pub use transcript::render_transcript;
