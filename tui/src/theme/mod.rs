//! Theme and Colors
//!
//! ArtBot's light and dark palettes, taken from the web widget's colors.
//! Theme choice lives only in the shell; the core never sees it.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Light Palette
// ============================================================================

/// Page background - warm paper
const LIGHT_BACKGROUND: Color = Color::Rgb(229, 222, 216); // #e5ded8

/// Header bar and buttons - deep indigo
const LIGHT_PRIMARY: Color = Color::Rgb(28, 22, 120); // #1C1678

/// Accents - bright blue
const LIGHT_SECONDARY: Color = Color::Rgb(53, 114, 239); // #3572EF

/// Chat window body
const LIGHT_PAPER: Color = Color::Rgb(255, 255, 255);

/// User bubbles - pale green
const LIGHT_USER: Color = Color::Rgb(220, 248, 198); // #dcf8c6

// ============================================================================
// Dark Palette
// ============================================================================

/// Page background
const DARK_BACKGROUND: Color = Color::Rgb(18, 18, 18); // #121212

/// Header bar
const DARK_HEADER: Color = Color::Rgb(30, 30, 30); // #1e1e1e

/// Buttons - coral
const DARK_PRIMARY: Color = Color::Rgb(221, 87, 70); // #DD5746

/// Accents - lavender
const DARK_SECONDARY: Color = Color::Rgb(139, 147, 255); // #8B93FF

/// Bot bubbles
const DARK_BOT: Color = Color::Rgb(51, 51, 51); // #333

/// User bubbles - midnight purple
const DARK_USER: Color = Color::Rgb(30, 3, 66); // #1E0342

/// Error text
const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Recording indicator (mic button while listening)
const RECORDING_BLUE: Color = Color::Rgb(1, 24, 216); // #0118D8

/// A full palette
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    /// Whether this is the dark palette
    pub dark: bool,
    /// Behind everything
    pub background: Color,
    /// Chat window header
    pub header: Color,
    /// Buttons and the brand
    pub primary: Color,
    /// Accents (bot name, tagline)
    pub secondary: Color,
    /// Chat window body
    pub paper: Color,
    /// Bot bubble background
    pub bot_message: Color,
    /// User bubble background
    pub user_message: Color,
    /// Main text
    pub text: Color,
    /// Timestamps and hints
    pub secondary_text: Color,
}

impl Theme {
    /// The light palette
    pub fn light() -> Self {
        Self {
            dark: false,
            background: LIGHT_BACKGROUND,
            header: LIGHT_PRIMARY,
            primary: LIGHT_PRIMARY,
            secondary: LIGHT_SECONDARY,
            paper: LIGHT_PAPER,
            bot_message: LIGHT_PAPER,
            user_message: LIGHT_USER,
            text: Color::Rgb(0, 0, 0),
            secondary_text: Color::Rgb(102, 102, 102),
        }
    }

    /// The dark palette
    pub fn dark() -> Self {
        Self {
            dark: true,
            background: DARK_BACKGROUND,
            header: DARK_HEADER,
            primary: DARK_PRIMARY,
            secondary: DARK_SECONDARY,
            paper: DARK_HEADER,
            bot_message: DARK_BOT,
            user_message: DARK_USER,
            text: Color::Rgb(255, 255, 255),
            secondary_text: Color::Rgb(170, 170, 170),
        }
    }

    /// Palette for the given mode
    pub fn for_mode(dark: bool) -> Self {
        if dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    /// The other palette
    pub fn toggled(self) -> Self {
        Self::for_mode(!self.dark)
    }

    /// Brand and tagline on the page background
    pub fn brand(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .bg(self.background)
            .add_modifier(Modifier::BOLD)
    }

    /// Chat window header
    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(Color::Rgb(255, 255, 255))
            .bg(self.header)
            .add_modifier(Modifier::BOLD)
    }

    /// Bot message bubble
    pub fn bot_style(&self) -> Style {
        Style::default().fg(self.text).bg(self.bot_message)
    }

    /// User message bubble
    pub fn user_style(&self) -> Style {
        Style::default().fg(self.text).bg(self.user_message)
    }

    /// Failed generation line
    pub fn error_style(&self) -> Style {
        Style::default()
            .fg(ERROR_RED)
            .bg(self.bot_message)
            .add_modifier(Modifier::BOLD)
    }

    /// Timestamps, loading dots and key hints
    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.secondary_text).bg(self.paper)
    }

    /// Mode buttons and the mic button
    pub fn button_style(&self, recording: bool) -> Style {
        let bg = if recording {
            RECORDING_BLUE
        } else {
            self.primary
        };
        Style::default()
            .fg(Color::Rgb(255, 255, 255))
            .bg(bg)
            .add_modifier(Modifier::BOLD)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_round_trips() {
        let light = Theme::light();
        assert!(light.toggled().dark);
        assert_eq!(light.toggled().toggled(), light);
    }

    #[test]
    fn test_recording_changes_button_color() {
        let theme = Theme::dark();
        assert_ne!(theme.button_style(true), theme.button_style(false));
    }
}
