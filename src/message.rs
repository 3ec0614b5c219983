//! Incoming stream events: messages, authors, and entity spans.

use serde::Deserialize;

/// What a span marks inside the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Mention,
    Tag,
}

/// Half-open character interval `[start, end)` into the original message
/// text. Offsets are character positions, not bytes — the platform counts
/// characters.
#[derive(Debug, Clone, Copy)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

impl Span {
    pub const fn new(start: usize, end: usize, kind: SpanKind) -> Self {
        Self { start, end, kind }
    }
}

/// One message as delivered by the stream. Immutable once received;
/// consumed exactly once by the listener, then discarded.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: u64,
    pub author_id: u64,
    pub author_screen_name: String,
    pub text: String,
    /// Mention spans followed by tag spans, in the order delivered.
    pub spans: Vec<Span>,
}

// Wire shapes for the stream's newline-delimited JSON. Events that are not
// messages (deletes, keep-alives, friend lists) lack these fields and are
// skipped by the caller.

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: u64,
    #[serde(alias = "full_text")]
    text: String,
    user: RawUser,
    #[serde(default)]
    entities: RawEntities,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: u64,
    screen_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntities {
    #[serde(default)]
    user_mentions: Vec<RawEntity>,
    #[serde(default)]
    hashtags: Vec<RawEntity>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    indices: [usize; 2],
}

/// Parse one stream line into a message, or `None` if the line is not a
/// message event.
pub fn parse_event(line: &str) -> Option<IncomingMessage> {
    let raw: RawEvent = serde_json::from_str(line).ok()?;

    let mut spans = Vec::with_capacity(raw.entities.user_mentions.len() + raw.entities.hashtags.len());
    for mention in &raw.entities.user_mentions {
        spans.push(Span::new(mention.indices[0], mention.indices[1], SpanKind::Mention));
    }
    for tag in &raw.entities.hashtags {
        spans.push(Span::new(tag.indices[0], tag.indices[1], SpanKind::Tag));
    }

    Some(IncomingMessage {
        id: raw.id,
        author_id: raw.user.id,
        author_screen_name: raw.user.screen_name,
        text: raw.text,
        spans,
    })
}
