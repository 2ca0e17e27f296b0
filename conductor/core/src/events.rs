//! Surface Events
//!
//! Events sent from the widget shell to the Conductor. These are the
//! visitor's intents, reported as they happen.
//!
//! # Design Philosophy
//!
//! The shell is a "dumb" renderer that forwards what the visitor did. It
//! doesn't decide whether an intent is allowed right now (e.g. a submit while
//! a request is in flight); the Conductor does, and silently drops intents
//! that don't apply.

use serde::{Deserialize, Serialize};

use crate::session::Mode;

/// Events from the widget shell to the Conductor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    // ============================================
    // Window Events
    // ============================================
    /// Open or close the chat window
    Toggle,

    /// The widget is going away; cancel everything
    Unmount,

    // ============================================
    // Conversation Events
    // ============================================
    /// A mode button was pressed
    ModeChosen {
        /// The chosen mode
        mode: Mode,
    },

    /// The text box contents changed
    DraftEdited {
        /// Full new contents
        text: String,
    },

    /// Enter was pressed in the text box
    EnterPressed {
        /// Whether a shift modifier was held (inserts a newline)
        shift: bool,
    },

    /// The send button was pressed
    Submit,

    /// The back button was pressed
    Back,

    /// The microphone button was pressed
    VoiceInput,
}

impl SurfaceEvent {
    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::Unmount => "unmount",
            Self::ModeChosen { .. } => "mode_chosen",
            Self::DraftEdited { .. } => "draft_edited",
            Self::EnterPressed { .. } => "enter_pressed",
            Self::Submit => "submit",
            Self::Back => "back",
            Self::VoiceInput => "voice_input",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(SurfaceEvent::Toggle.name(), "toggle");
        assert_eq!(
            SurfaceEvent::ModeChosen { mode: Mode::Image }.name(),
            "mode_chosen"
        );
        assert_eq!(SurfaceEvent::EnterPressed { shift: true }.name(), "enter_pressed");
    }

    #[test]
    fn test_event_serialization() {
        let event = SurfaceEvent::ModeChosen { mode: Mode::Poem };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"ModeChosen":{"mode":"poem"}}"#);
        let back: SurfaceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
