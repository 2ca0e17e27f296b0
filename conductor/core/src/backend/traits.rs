//! Backend Traits
//!
//! Interfaces to the two external services the widget talks to: the
//! generation service (poem or image from a prompt) and the voice
//! transcription service. The Conductor only sees these traits, so tests
//! can swap in scripted backends.

use async_trait::async_trait;
use thiserror::Error;

use crate::session::Mode;
use crate::transcript::GenerationResult;

/// A prompt to generate content for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    /// What to generate
    pub mode: Mode,
    /// Prompt text, sent as typed
    pub prompt: String,
}

impl GenerationRequest {
    /// Create a request
    pub fn new(mode: Mode, prompt: impl Into<String>) -> Self {
        Self {
            mode,
            prompt: prompt.into(),
        }
    }
}

/// Content returned by a successful generation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationOutput {
    /// The generated poem or image
    pub result: GenerationResult,
    /// Round-trip time in milliseconds (if measured)
    pub duration_ms: Option<u64>,
}

impl GenerationOutput {
    /// Wrap a result without timing information
    #[must_use]
    pub fn new(result: GenerationResult) -> Self {
        Self {
            result,
            duration_ms: None,
        }
    }
}

/// Failure talking to an external service
///
/// Every variant is surfaced the same way to the visitor; the distinction
/// exists for logs.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection, DNS or other transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("service returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// Response body was not the expected JSON
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Response decoded but carried no usable result
    #[error("response carried no usable result")]
    MissingResult,

    /// No response within the configured time
    #[error("request timed out after {after_ms} ms")]
    Timeout {
        /// Configured timeout
        after_ms: u64,
    },
}

/// Generation service
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Generate content for `request`
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationOutput, BackendError>;
}

/// Voice transcription service
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Record and transcribe one utterance, returning the text
    async fn transcribe(&self) -> Result<String, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_request_new() {
        let request = GenerationRequest::new(Mode::Poem, "a sunset");
        assert_eq!(request.mode, Mode::Poem);
        assert_eq!(request.prompt, "a sunset");
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "service returned 500: boom");
        assert_eq!(
            BackendError::Timeout { after_ms: 10 }.to_string(),
            "request timed out after 10 ms"
        );
    }
}
