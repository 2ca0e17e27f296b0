//! Bot Script
//!
//! The fixed lines ArtBot types into the transcript and the default
//! background tagline phrases. The conductor decides *when* each line is
//! typed; this module only knows *what* is said.

use serde::{Deserialize, Serialize};

use crate::session::Mode;

/// First line typed after the initial loading screen
pub const HELLO: &str = "Hello";

/// Question that precedes the mode buttons on first open
pub const MODE_QUESTION: &str = "What do you want to do today?";

/// Question that precedes the mode buttons after "back"
pub const HELLO_AGAIN: &str = "Hello again! What do you want to do today?";

/// Reply to an empty or whitespace-only submission
pub const EMPTY_PROMPT: &str = "Please enter a prompt!";

/// Text of a successful generation reply
pub const RESULT_READY: &str = "Here's your result:";

/// Text of a failed generation reply
pub const GENERATION_FAILED: &str = "Error generating content. Please try again.";

/// Default phrases cycled by the background tagline looper
pub const DEFAULT_TAGLINES: &[&str] = &[
    "Hi There!! Welcome to GenArtVerse",
    "An Application for Generating Poem and Images",
    "Just enter your prompt and get Content of your choice",
    "Awesome right? 😇 Give it a try",
];

/// Echo of the user's mode choice
#[must_use]
pub fn mode_choice_echo(mode: Mode) -> String {
    format!("I want to generate a {mode}")
}

/// Prompt request typed after a mode is chosen
#[must_use]
pub fn prompt_request(mode: Mode) -> String {
    format!("Great! Please enter a prompt for your {mode}:")
}

/// Placeholder text shown while a request is in flight
#[must_use]
pub fn generating(mode: Mode) -> String {
    format!("Generating {mode}")
}

/// A line ArtBot types with the foreground typewriter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Line {
    /// "Hello"
    Hello,
    /// "What do you want to do today?"
    ModeQuestion,
    /// "Hello again! What do you want to do today?"
    HelloAgain,
    /// "Great! Please enter a prompt for your {mode}:"
    PromptRequest(Mode),
}

impl Line {
    /// Literal text of the line
    #[must_use]
    pub fn text(self) -> String {
        match self {
            Self::Hello => HELLO.to_string(),
            Self::ModeQuestion => MODE_QUESTION.to_string(),
            Self::HelloAgain => HELLO_AGAIN.to_string(),
            Self::PromptRequest(mode) => prompt_request(mode),
        }
    }

    /// Whether the mode buttons follow this line once it is committed
    #[must_use]
    pub fn offers_mode_choice(self) -> bool {
        matches!(self, Self::ModeQuestion | Self::HelloAgain)
    }
}

/// Whether `text` is one of the literal lines that precede the mode buttons
#[must_use]
pub fn is_mode_question(text: &str) -> bool {
    text == MODE_QUESTION || text == HELLO_AGAIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_lines() {
        assert_eq!(mode_choice_echo(Mode::Poem), "I want to generate a poem");
        assert_eq!(
            prompt_request(Mode::Image),
            "Great! Please enter a prompt for your image:"
        );
        assert_eq!(generating(Mode::Poem), "Generating poem");
    }

    #[test]
    fn test_offers_mode_choice() {
        assert!(Line::ModeQuestion.offers_mode_choice());
        assert!(Line::HelloAgain.offers_mode_choice());
        assert!(!Line::Hello.offers_mode_choice());
        assert!(!Line::PromptRequest(Mode::Poem).offers_mode_choice());
        assert!(is_mode_question(&Line::HelloAgain.text()));
        assert!(!is_mode_question(HELLO));
    }
}
