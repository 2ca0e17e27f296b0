//! Display State Types
//!
//! Types that represent the current display state for the TUI.
//! These are derived from ConductorMessages and used for rendering.
//!
//! # Design Philosophy
//!
//! The TUI is a "thin client" - it just renders what the Conductor tells it to.
//! Display state is the bridge between ConductorMessages and rendering; it is
//! never written from anywhere else, except for the path a saved image landed
//! at, which only the shell knows.

use std::path::PathBuf;

use chrono::{Local, TimeZone};

use artbot_core::{
    Author, ChatMessage, ConductorMessage, GenerationResult, ImagePayload, MessagePhase, Mode,
    SessionPhase,
};

/// A rendered transcript entry
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayMessage {
    /// The entry as the Conductor sent it
    pub message: ChatMessage,
    /// Where an inline image result was written, once saved
    pub saved_to: Option<PathBuf>,
}

impl DisplayMessage {
    /// Wrap a transcript entry
    pub fn new(message: ChatMessage) -> Self {
        Self {
            message,
            saved_to: None,
        }
    }

    /// Who wrote this entry
    pub fn author(&self) -> Author {
        self.message.author
    }

    /// Prefix shown before the first line
    pub fn prefix(&self) -> &'static str {
        match self.message.author {
            Author::Bot => "ArtBot: ",
            Author::User => "You: ",
        }
    }

    /// Local `HH:MM` creation time
    pub fn time_label(&self) -> String {
        i64::try_from(self.message.timestamp_ms)
            .ok()
            .and_then(|ms| Local.timestamp_millis_opt(ms).single())
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default()
    }

    /// Whether this is the loading placeholder
    pub fn is_loading(&self) -> bool {
        self.message.phase == MessagePhase::LoadingPlaceholder
    }

    /// Whether this is a failed generation
    pub fn is_error(&self) -> bool {
        self.message.phase == MessagePhase::Error
    }

    /// Body lines below the message text (poem block or image summary)
    pub fn result_lines(&self) -> Vec<String> {
        match &self.message.result {
            None => Vec::new(),
            Some(GenerationResult::Poem(poem)) => poem.lines().map(str::to_string).collect(),
            Some(GenerationResult::Image(payload)) => {
                let mut lines = vec!["Generated Image".to_string()];
                match payload {
                    ImagePayload::Inline { mime_type, .. } => {
                        lines.push(format!("[{}, {} bytes]", mime_type, payload.byte_len()));
                    }
                    ImagePayload::Reference(reference) => lines.push(reference.clone()),
                }
                if let Some(path) = &self.saved_to {
                    lines.push(format!("saved to {}", path.display()));
                }
                lines
            }
        }
    }
}

/// The full display state for the TUI
#[derive(Debug, Default)]
pub struct DisplayState {
    /// Conversation phase
    pub phase: SessionPhase,
    /// Whether the chat window is open
    pub open: bool,
    /// Whether the loading screen is up
    pub loading: bool,
    /// Transcript
    pub messages: Vec<DisplayMessage>,
    /// Partial text of the reply being typed
    pub typing: Option<String>,
    /// Current background tagline frame
    pub tagline: String,
    /// Whether the mode buttons are shown
    pub mode_choice_visible: bool,
    /// Selected mode
    pub selected_mode: Option<Mode>,
    /// Text-box contents
    pub draft: String,
    /// Whether a voice recording is in progress
    pub recording: bool,
    /// Whether the Conductor has unmounted
    pub unmounted: bool,
}

impl DisplayState {
    /// Create a new display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a ConductorMessage to update display state
    pub fn apply_message(&mut self, msg: ConductorMessage) {
        match msg {
            // Lifecycle
            ConductorMessage::State { phase } => {
                self.phase = phase;
            }
            ConductorMessage::Visibility { open } => {
                self.open = open;
            }
            ConductorMessage::Loading { visible } => {
                self.loading = visible;
            }
            ConductorMessage::Unmounted => {
                *self = Self {
                    tagline: std::mem::take(&mut self.tagline),
                    unmounted: true,
                    ..Self::default()
                };
            }

            // Transcript
            ConductorMessage::MessageAppended { index, message } => {
                if index != self.messages.len() {
                    tracing::warn!(
                        index,
                        len = self.messages.len(),
                        "Transcript append out of step with Conductor"
                    );
                }
                self.messages.push(DisplayMessage::new(message));
            }
            ConductorMessage::MessageReplaced { index, message } => {
                if let Some(slot) = self.messages.get_mut(index) {
                    *slot = DisplayMessage::new(message);
                }
            }
            ConductorMessage::TranscriptCleared => {
                self.messages.clear();
            }

            // Animation
            ConductorMessage::TypingFrame { text } => {
                self.typing = Some(text);
            }
            ConductorMessage::TypingStopped => {
                self.typing = None;
            }
            ConductorMessage::Tagline { text } => {
                self.tagline = text;
            }

            // Controls
            ConductorMessage::ModeChoice { visible } => {
                self.mode_choice_visible = visible;
            }
            ConductorMessage::ModeSelected { mode } => {
                self.selected_mode = mode;
            }
            ConductorMessage::Draft { text } => {
                self.draft = text;
            }
            ConductorMessage::Recording { active } => {
                self.recording = active;
            }
        }
    }

    /// Whether a reply is being typed
    pub fn is_typing(&self) -> bool {
        self.typing.is_some()
    }

    /// Whether a generation request is in flight
    pub fn generating(&self) -> bool {
        self.messages.iter().any(DisplayMessage::is_loading)
    }

    /// Whether the text box is shown
    pub fn input_visible(&self) -> bool {
        self.open && !self.loading && self.selected_mode.is_some() && !self.generating()
    }

    /// Whether the back button is shown
    pub fn back_available(&self) -> bool {
        self.selected_mode.is_some()
    }

    /// Text-box placeholder
    pub fn input_placeholder(&self) -> String {
        self.selected_mode
            .map(|mode| format!("Enter your {mode} prompt..."))
            .unwrap_or_default()
    }

    /// Record where an image result was saved
    pub fn set_saved_path(&mut self, index: usize, path: PathBuf) {
        if let Some(msg) = self.messages.get_mut(index) {
            msg.saved_to = Some(path);
        }
    }
}
