//! ArtBot TUI - Terminal chat widget for the text-to-art generator
//!
//! A full-screen page with the "GenArtVerse" brand and a looping tagline,
//! plus a chat window where ArtBot greets the user, offers poem or image
//! generation, and shows the results.
//!
//! # Architecture
//!
//! - **ConductorClient**: embeds the headless Conductor from `artbot-core`
//! - **DisplayState**: everything on screen, rebuilt from ConductorMessages
//! - **App**: key mapping, event loop and rendering
//! - **ImageSaver**: writes inline image results to disk
//! - **Theme**: light and dark palettes

pub mod app;
pub mod conductor_client;
pub mod display;
pub mod images;
pub mod theme;

pub use app::{map_key, App, KeyAction};
pub use conductor_client::ConductorClient;
pub use display::{DisplayMessage, DisplayState};
pub use images::ImageSaver;
pub use theme::Theme;
