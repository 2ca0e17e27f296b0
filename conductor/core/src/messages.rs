//! Conductor Messages
//!
//! Messages sent from the Conductor to the widget shell. Together they are
//! everything the shell needs to draw the widget; the shell keeps no
//! conversation state of its own beyond what these messages tell it.
//!
//! # Ordering
//!
//! Messages are sent in the order the Conductor made the corresponding
//! change, so a shell that applies them in order always mirrors the session.
//! `Tagline` frames come from an independent loop and may interleave
//! anywhere; they are lossy and only the latest one matters.

use serde::{Deserialize, Serialize};

use crate::session::{Mode, SessionPhase};
use crate::transcript::ChatMessage;

/// Messages from Conductor to the widget shell
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConductorMessage {
    // ============================================
    // Lifecycle
    // ============================================
    /// Conversation phase changed
    State {
        /// The new phase
        phase: SessionPhase,
    },

    /// The chat window opened or closed
    Visibility {
        /// Whether the window is open
        open: bool,
    },

    /// The loading screen appeared or went away
    Loading {
        /// Whether the loading screen is shown
        visible: bool,
    },

    /// The widget was unmounted; nothing else will be sent
    Unmounted,

    // ============================================
    // Transcript
    // ============================================
    /// An entry was added at the end
    MessageAppended {
        /// Position of the entry
        index: usize,
        /// The entry
        message: ChatMessage,
    },

    /// The entry at `index` was replaced (placeholder settled)
    MessageReplaced {
        /// Position of the entry
        index: usize,
        /// The new entry
        message: ChatMessage,
    },

    /// The transcript was emptied
    TranscriptCleared,

    // ============================================
    // Animation
    // ============================================
    /// Partial text of the reply being typed
    TypingFrame {
        /// Text revealed so far
        text: String,
    },

    /// The reply being typed was committed or abandoned
    TypingStopped,

    /// Background tagline frame
    Tagline {
        /// Text to show
        text: String,
    },

    // ============================================
    // Controls
    // ============================================
    /// Mode buttons appeared or went away
    ModeChoice {
        /// Whether the buttons are shown
        visible: bool,
    },

    /// The selected mode changed (`None` after "back")
    ModeSelected {
        /// The selected mode
        mode: Option<Mode>,
    },

    /// The text box contents changed on the Conductor's side
    Draft {
        /// Full new contents
        text: String,
    },

    /// Voice recording started or stopped
    Recording {
        /// Whether a recording is in progress
        active: bool,
    },
}

impl ConductorMessage {
    /// Whether this is a background tagline frame
    #[must_use]
    pub fn is_tagline(&self) -> bool {
        matches!(self, Self::Tagline { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_tagline() {
        assert!(ConductorMessage::Tagline {
            text: "Hi".to_string()
        }
        .is_tagline());
        assert!(!ConductorMessage::TypingStopped.is_tagline());
    }

    #[test]
    fn test_message_serialization() {
        let msg = ConductorMessage::MessageAppended {
            index: 0,
            message: ChatMessage::bot("Hello"),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: ConductorMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
