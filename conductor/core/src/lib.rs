//! ArtBot Core - Headless Conversation Engine for the ArtBot widget
//!
//! This crate holds everything ArtBot does except drawing: the scripted
//! greeting, the mode choice, the typewriter effects, and the poem/image
//! generation round trip. It can drive a terminal shell, a web shell, or run
//! headless for tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Widget Shell                           │
//! │        (renders ConductorMessages, forwards intents)          │
//! └──────────────┬───────────────────────────────▲────────────────┘
//!                │ SurfaceEvent (up)             │ ConductorMessage (down)
//! ┌──────────────▼───────────────────────────────┴────────────────┐
//! │                          Conductor                             │
//! │  ┌──────────┐  ┌────────────┐  ┌───────────┐  ┌─────────────┐ │
//! │  │ Session  │  │ Typewriter │  │  Tagline  │  │ Generation  │ │
//! │  │ + Log    │  │ + Beats    │  │  Looper   │  │ Orchestrator│ │
//! │  └──────────┘  └────────────┘  └───────────┘  └──────┬──────┘ │
//! └───────────────────────────────────────────────────────┼───────┘
//!                                                         │ HTTP
//!                                           generation / voice service
//! ```
//!
//! # Key Types
//!
//! - [`Conductor`]: The state machine that owns the session
//! - [`ConductorMessage`]: Messages sent from Conductor to the shell
//! - [`SurfaceEvent`]: Intents sent from the shell to Conductor
//! - [`Session`]: Phase, selected mode, draft and transcript
//! - [`HttpBackend`]: Client for the generation and transcription service
//!
//! # Quick Start
//!
//! ```ignore
//! use artbot_core::{load_config, Conductor, HttpBackend, SurfaceEvent};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let backend = HttpBackend::new(config.base_url.clone());
//!     let mut conductor = Conductor::new(backend, config.conductor_config(), tx);
//!
//!     conductor.start().await?;
//!     conductor.handle_event(SurfaceEvent::Toggle).await?;
//!
//!     loop {
//!         // Apply timer ticks and service replies
//!         conductor.poll_internal().await;
//!
//!         while let Ok(msg) = rx.try_recv() {
//!             // Render message
//!         }
//!
//!         // Forward visitor input as SurfaceEvents
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`animation`]: Typewriter runs, tagline looper, timers
//! - [`backend`]: Generation/transcription service abstraction and HTTP client
//! - [`conductor`]: Main Conductor struct
//! - [`config`]: TOML + environment configuration
//! - [`events`]: Events from the shell to Conductor
//! - [`generation`]: Single in-flight request bookkeeping
//! - [`messages`]: Messages from Conductor to the shell
//! - [`script`]: The fixed lines ArtBot says
//! - [`session`]: Session phase and state
//! - [`transcript`]: Chat messages and the message log
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod backend;
pub mod conductor;
pub mod config;
pub mod events;
pub mod generation;
pub mod messages;
pub mod script;
pub mod session;
pub mod transcript;

// Re-exports for convenience
pub use backend::{
    BackendError, GenerationBackend, GenerationOutput, GenerationRequest, HttpBackend,
    TranscriptionBackend,
};
pub use conductor::{Conductor, ConductorConfig, Timings};
pub use events::SurfaceEvent;
pub use generation::{GenerationOrchestrator, RequestId, Settlement, SubmitError};
pub use messages::ConductorMessage;
pub use session::{Mode, Session, SessionPhase};
pub use transcript::{
    Author, ChatMessage, GenerationResult, ImagePayload, MessageLog, MessagePhase,
};

// Animation exports
pub use animation::{
    RunId, TaglineLooper, TaglineTimings, TickRange, Typewriter, TypewriterEvent, TypewriterRun,
};

// Config exports
pub use config::{
    default_config_path, default_image_dir, load_config, load_config_from_path, ArtbotConfig,
    ArtbotToml, ConfigError, ConfigOverrides, ConfigSource,
};
