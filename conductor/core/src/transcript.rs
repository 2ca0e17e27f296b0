//! Transcript
//!
//! The message log shown in the chat window. The log is append-only with a
//! single exception: the one loading placeholder of an in-flight generation
//! is replaced in place once the request settles.
//!
//! # Invariants
//!
//! - At most one [`MessagePhase::LoadingPlaceholder`] entry exists at a time
//!   (enforced by [`GenerationOrchestrator`](crate::generation::GenerationOrchestrator)).
//! - Replacing the placeholder keeps its position and touches no other entry.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::session::Mode;

/// Who wrote a transcript entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Author {
    /// ArtBot
    Bot,
    /// The visitor
    User,
}

/// Render mode of a transcript entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessagePhase {
    /// Plain message
    #[default]
    Normal,
    /// Stand-in for a result while a request is in flight
    LoadingPlaceholder,
    /// Failed generation
    Error,
}

/// Image returned by the generation service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImagePayload {
    /// Decoded bytes of a `data:<mime>;base64,<payload>` URL
    Inline {
        /// MIME type from the data URL (e.g. `image/png`)
        mime_type: String,
        /// Decoded image bytes
        data: Vec<u8>,
    },
    /// Anything that is not an inline data URL (usually a plain URL)
    Reference(String),
}

impl ImagePayload {
    /// Interpret the `image_base64` string returned by the service.
    ///
    /// Data URLs with a base64 payload are decoded; a data URL whose payload
    /// does not decode is kept as a reference rather than dropped.
    #[must_use]
    pub fn from_service_string(raw: &str) -> Self {
        let Some(rest) = raw.strip_prefix("data:") else {
            return Self::Reference(raw.to_string());
        };
        let Some((header, payload)) = rest.split_once(',') else {
            return Self::Reference(raw.to_string());
        };
        let Some(mime_type) = header.strip_suffix(";base64") else {
            return Self::Reference(raw.to_string());
        };

        match STANDARD.decode(payload.trim()) {
            Ok(data) => Self::Inline {
                mime_type: if mime_type.is_empty() {
                    "application/octet-stream".to_string()
                } else {
                    mime_type.to_string()
                },
                data,
            },
            Err(e) => {
                tracing::debug!(error = %e, "Image data URL did not decode; keeping as reference");
                Self::Reference(raw.to_string())
            }
        }
    }

    /// Size of the inline payload in bytes (0 for references)
    #[must_use]
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Inline { data, .. } => data.len(),
            Self::Reference(_) => 0,
        }
    }

    /// File extension suggested by the MIME type
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Inline { mime_type, .. } => match mime_type.as_str() {
                "image/png" => "png",
                "image/jpeg" | "image/jpg" => "jpg",
                "image/gif" => "gif",
                "image/webp" => "webp",
                _ => "bin",
            },
            Self::Reference(_) => "txt",
        }
    }
}

/// Content of a completed generation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationResult {
    /// Poem text
    Poem(String),
    /// Generated image
    Image(ImagePayload),
}

impl GenerationResult {
    /// The mode that produced this result
    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            Self::Poem(_) => Mode::Poem,
            Self::Image(_) => Mode::Image,
        }
    }
}

/// One transcript entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display text
    pub text: String,
    /// Who wrote it
    pub author: Author,
    /// Render mode
    pub phase: MessagePhase,
    /// Present only on a successful generation reply
    pub result: Option<GenerationResult>,
    /// When the entry was created (Unix timestamp ms)
    pub timestamp_ms: u64,
}

impl ChatMessage {
    fn new(author: Author, phase: MessagePhase, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author,
            phase,
            result: None,
            timestamp_ms: now_ms(),
        }
    }

    /// Plain bot line
    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Author::Bot, MessagePhase::Normal, text)
    }

    /// Plain user line
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Author::User, MessagePhase::Normal, text)
    }

    /// Loading placeholder for an in-flight request
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::new(Author::Bot, MessagePhase::LoadingPlaceholder, text)
    }

    /// Failed generation reply
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Author::Bot, MessagePhase::Error, text)
    }

    /// Successful generation reply
    pub fn with_result(text: impl Into<String>, result: GenerationResult) -> Self {
        let mut msg = Self::bot(text);
        msg.result = Some(result);
        msg
    }

    /// Whether this entry is a loading placeholder
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.phase == MessagePhase::LoadingPlaceholder
    }
}

/// Ordered transcript
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
}

impl MessageLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, returning its index
    pub fn append(&mut self, message: ChatMessage) -> usize {
        self.entries.push(message);
        self.entries.len() - 1
    }

    /// Replace the loading placeholder in place.
    ///
    /// Returns the index that was replaced, or `None` (and leaves the log
    /// untouched) when no placeholder exists.
    pub fn replace_placeholder(&mut self, message: ChatMessage) -> Option<usize> {
        let Some(index) = self.entries.iter().position(ChatMessage::is_placeholder) else {
            tracing::debug!("No loading placeholder to replace");
            return None;
        };
        self.entries[index] = message;
        Some(index)
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Most recent entry authored by the bot
    #[must_use]
    pub fn last_bot_message(&self) -> Option<&ChatMessage> {
        self.entries.iter().rev().find(|m| m.author == Author::Bot)
    }

    /// Number of loading placeholders currently in the log
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.entries.iter().filter(|m| m.is_placeholder()).count()
    }

    /// Entry at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.entries.get(index)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in order
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter()
    }

    /// All entries
    #[must_use]
    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.entries
    }
}

/// Get current timestamp in milliseconds
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_returns_index() {
        let mut log = MessageLog::new();
        assert_eq!(log.append(ChatMessage::bot("Hello")), 0);
        assert_eq!(log.append(ChatMessage::user("hi")), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_replace_placeholder_keeps_position() {
        let mut log = MessageLog::new();
        log.append(ChatMessage::user("I want to generate a poem"));
        log.append(ChatMessage::user("a sunset"));
        log.append(ChatMessage::placeholder("Generating poem"));
        let before: Vec<_> = log.iter().take(2).cloned().collect();

        let replaced = log.replace_placeholder(ChatMessage::with_result(
            "Here's your result:",
            GenerationResult::Poem("Golden hues...".to_string()),
        ));

        assert_eq!(replaced, Some(2));
        assert_eq!(log.placeholder_count(), 0);
        assert_eq!(log.as_slice()[..2], before[..]);
        assert_eq!(log.get(2).unwrap().text, "Here's your result:");
    }

    #[test]
    fn test_replace_placeholder_without_placeholder_is_noop() {
        let mut log = MessageLog::new();
        log.append(ChatMessage::bot("Hello"));

        assert_eq!(log.replace_placeholder(ChatMessage::error("boom")), None);
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(0).unwrap().text, "Hello");
    }

    #[test]
    fn test_last_bot_message_skips_user_entries() {
        let mut log = MessageLog::new();
        assert!(log.last_bot_message().is_none());

        log.append(ChatMessage::bot("What do you want to do today?"));
        log.append(ChatMessage::user("I want to generate a poem"));

        assert_eq!(
            log.last_bot_message().unwrap().text,
            "What do you want to do today?"
        );
    }

    #[test]
    fn test_clear() {
        let mut log = MessageLog::new();
        log.append(ChatMessage::bot("Hello"));
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_image_payload_data_url() {
        let payload = ImagePayload::from_service_string("data:image/png;base64,aGVsbG8=");
        assert_eq!(
            payload,
            ImagePayload::Inline {
                mime_type: "image/png".to_string(),
                data: b"hello".to_vec(),
            }
        );
        assert_eq!(payload.byte_len(), 5);
        assert_eq!(payload.extension(), "png");
    }

    #[test]
    fn test_image_payload_reference() {
        let url = "https://example.com/cat.png";
        assert_eq!(
            ImagePayload::from_service_string(url),
            ImagePayload::Reference(url.to_string())
        );

        // Corrupt base64 is kept verbatim
        let bad = "data:image/png;base64,***";
        assert_eq!(
            ImagePayload::from_service_string(bad),
            ImagePayload::Reference(bad.to_string())
        );
    }

    #[test]
    fn test_result_mode() {
        assert_eq!(GenerationResult::Poem(String::new()).mode(), Mode::Poem);
        assert_eq!(
            GenerationResult::Image(ImagePayload::Reference(String::new())).mode(),
            Mode::Image
        );
    }
}
