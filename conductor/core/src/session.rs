//! Session Management
//!
//! The single live conversation of one mounted widget. The session is owned
//! exclusively by the [`Conductor`](crate::Conductor); surfaces only ever see
//! it through [`ConductorMessage`](crate::ConductorMessage)s or read-only
//! accessors.
//!
//! A session is created when the widget mounts and thrown away when it
//! unmounts. Nothing is persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::script;
use crate::transcript::MessageLog;

/// Generation target chosen by the visitor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Write a poem
    Poem,
    /// Draw an image
    Image,
}

impl Mode {
    /// Wire name used by the generation service
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poem => "poem",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversation phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Not yet opened, or unmounted
    #[default]
    Closed,
    /// Loading screen and the opening lines
    Greeting,
    /// Mode buttons are on offer
    AwaitingModeChoice,
    /// A mode was chosen; the visitor may submit prompts
    AwaitingPrompt,
    /// A generation request is in flight
    Generating,
    /// Widget window hidden after having been opened
    Idle,
}

/// The live conversation
#[derive(Clone, Debug, Default)]
pub struct Session {
    /// Current phase
    pub phase: SessionPhase,
    /// Mode chosen by the visitor, if any
    pub selected_mode: Option<Mode>,
    /// Text-box contents
    pub draft_prompt: String,
    /// Transcript
    pub log: MessageLog,
    /// Whether the mode buttons are on offer
    pub awaiting_mode_choice: bool,
    /// Whether the widget window is open
    pub open: bool,
    /// Phase to restore when the window reopens
    resume_phase: Option<SessionPhase>,
}

impl Session {
    /// Create a new, closed session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to `phase`, deferring it until reopen if the window is hidden
    pub fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase == SessionPhase::Idle && !self.open {
            self.resume_phase = Some(phase);
        } else {
            self.phase = phase;
        }
    }

    /// The phase the conversation is in, ignoring window visibility
    #[must_use]
    pub fn conversation_phase(&self) -> SessionPhase {
        match (self.phase, self.resume_phase) {
            (SessionPhase::Idle, Some(phase)) => phase,
            (phase, _) => phase,
        }
    }

    /// Hide the window; the conversation phase is parked until reopen
    pub fn hide(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if self.phase != SessionPhase::Closed {
            self.resume_phase = Some(self.phase);
            self.phase = SessionPhase::Idle;
        }
    }

    /// Show the window, restoring the parked phase
    pub fn show(&mut self) {
        if self.open {
            return;
        }
        self.open = true;
        if let Some(phase) = self.resume_phase.take() {
            self.phase = phase;
        }
    }

    /// Forget the mode, draft and transcript (the "back" reset)
    pub fn reset_conversation(&mut self) {
        self.selected_mode = None;
        self.draft_prompt.clear();
        self.log.clear();
        self.awaiting_mode_choice = false;
    }

    /// Whether the mode buttons should be shown
    #[must_use]
    pub fn show_mode_choice(&self) -> bool {
        self.awaiting_mode_choice
    }

    /// Mode-button visibility derived from the transcript.
    ///
    /// Buttons show iff no mode is selected, no typewriter run is active and
    /// the last bot line is one of the two mode questions.
    #[must_use]
    pub fn mode_choice_derived(&self, typing_active: bool) -> bool {
        self.selected_mode.is_none()
            && !typing_active
            && self
                .log
                .last_bot_message()
                .is_some_and(|m| script::is_mode_question(&m.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::ChatMessage;

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(Mode::Poem.to_string(), "poem");
        assert_eq!(Mode::Image.as_str(), "image");
        assert_eq!(serde_json::to_string(&Mode::Image).unwrap(), "\"image\"");
    }

    #[test]
    fn test_new_session_is_closed() {
        let session = Session::new();
        assert_eq!(session.phase, SessionPhase::Closed);
        assert!(!session.open);
        assert!(session.log.is_empty());
        assert!(session.selected_mode.is_none());
    }

    #[test]
    fn test_hide_and_show_restore_phase() {
        let mut session = Session::new();
        session.show();
        session.set_phase(SessionPhase::AwaitingPrompt);

        session.hide();
        assert_eq!(session.phase, SessionPhase::Idle);
        assert_eq!(session.conversation_phase(), SessionPhase::AwaitingPrompt);

        // Changes while hidden land on the parked phase
        session.set_phase(SessionPhase::Generating);
        assert_eq!(session.phase, SessionPhase::Idle);

        session.show();
        assert_eq!(session.phase, SessionPhase::Generating);
    }

    #[test]
    fn test_reset_conversation() {
        let mut session = Session::new();
        session.selected_mode = Some(Mode::Poem);
        session.draft_prompt = "a sunset".to_string();
        session.log.append(ChatMessage::user("a sunset"));
        session.awaiting_mode_choice = true;

        session.reset_conversation();

        assert!(session.selected_mode.is_none());
        assert!(session.draft_prompt.is_empty());
        assert!(session.log.is_empty());
        assert!(!session.show_mode_choice());
    }

    #[test]
    fn test_mode_choice_derived() {
        let mut session = Session::new();
        assert!(!session.mode_choice_derived(false));

        session.log.append(ChatMessage::bot(script::MODE_QUESTION));
        assert!(session.mode_choice_derived(false));
        assert!(!session.mode_choice_derived(true));

        session.selected_mode = Some(Mode::Image);
        assert!(!session.mode_choice_derived(false));
    }
}
