//! Service Backends
//!
//! Abstracted access to the external generation and voice transcription
//! services through a pair of traits.
//!
//! # Available Backends
//!
//! - **HTTP**: the generation service's REST API (default `http://localhost:8000`)
//!
//! # Usage
//!
//! ```ignore
//! use artbot_core::backend::{GenerationBackend, GenerationRequest, HttpBackend};
//! use artbot_core::{load_config, Mode};
//!
//! let config = load_config()?;
//! let backend = HttpBackend::new(config.base_url);
//! let output = backend
//!     .generate(&GenerationRequest::new(Mode::Poem, "a sunset"))
//!     .await?;
//! ```

mod http;
mod traits;

pub use http::{HttpBackend, DEFAULT_BASE_URL};
pub use traits::{
    BackendError, GenerationBackend, GenerationOutput, GenerationRequest, TranscriptionBackend,
};
