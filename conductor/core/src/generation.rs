//! Generation Orchestrator
//!
//! Owns the lifecycle of the one generation request a session may have in
//! flight: echo the prompt, insert the loading placeholder, and later swap
//! the placeholder for the result or an error line.
//!
//! The orchestrator is synchronous bookkeeping. The Conductor performs the
//! actual backend call (see [`generate_with_timeout`]) on a spawned task and
//! feeds the outcome back through [`GenerationOrchestrator::resolve`].

use std::time::Duration;

use thiserror::Error;

use crate::backend::{BackendError, GenerationBackend, GenerationOutput, GenerationRequest};
use crate::script;
use crate::session::Mode;
use crate::transcript::{ChatMessage, MessageLog};

/// Identifier of one generation request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Generate a new unique request ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a submission was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Prompt was empty or whitespace only
    #[error("prompt is empty")]
    EmptyPrompt,
    /// Another request is still in flight
    #[error("a generation request is already in flight")]
    RequestInProgress,
}

/// Everything the caller needs to run an accepted submission
#[derive(Clone, Debug)]
pub struct RequestTicket {
    /// Id to hand back to [`GenerationOrchestrator::resolve`]
    pub id: RequestId,
    /// What to send to the service
    pub request: GenerationRequest,
    /// Index of the echoed prompt
    pub prompt_index: usize,
    /// Index of the loading placeholder
    pub placeholder_index: usize,
}

/// How a settled request changed the log
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    /// Result line or error line for the request
    pub message: ChatMessage,
    /// Where it replaced the placeholder; `None` if the placeholder was gone
    pub index: Option<usize>,
}

#[derive(Clone, Copy, Debug)]
struct InFlight {
    id: RequestId,
    mode: Mode,
}

/// Single-request generation bookkeeping
#[derive(Debug, Default)]
pub struct GenerationOrchestrator {
    in_flight: Option<InFlight>,
}

impl GenerationOrchestrator {
    /// Create an idle orchestrator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a request is in flight
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Accept a submission: append the prompt echo and the placeholder.
    ///
    /// # Errors
    ///
    /// `RequestInProgress` if a request is already in flight (checked
    /// first), `EmptyPrompt` if `prompt` is blank. Neither touches the log.
    pub fn begin(
        &mut self,
        log: &mut MessageLog,
        mode: Mode,
        prompt: &str,
    ) -> Result<RequestTicket, SubmitError> {
        if self.in_flight.is_some() {
            return Err(SubmitError::RequestInProgress);
        }
        if prompt.trim().is_empty() {
            return Err(SubmitError::EmptyPrompt);
        }

        let prompt_index = log.append(ChatMessage::user(prompt));
        let placeholder_index = log.append(ChatMessage::placeholder(script::generating(mode)));
        let id = RequestId::new();
        self.in_flight = Some(InFlight { id, mode });

        tracing::debug!(request_id = id.0, %mode, "Generation request started");
        Ok(RequestTicket {
            id,
            request: GenerationRequest::new(mode, prompt),
            prompt_index,
            placeholder_index,
        })
    }

    /// Settle request `id`, replacing its placeholder.
    ///
    /// Returns `None` if `id` is not the in-flight request (stale or
    /// abandoned). Otherwise the request is settled even when the
    /// placeholder can no longer be found.
    pub fn resolve(
        &mut self,
        log: &mut MessageLog,
        id: RequestId,
        outcome: Result<GenerationOutput, BackendError>,
    ) -> Option<Settlement> {
        let in_flight = match self.in_flight {
            Some(f) if f.id == id => f,
            _ => {
                tracing::debug!(request_id = id.0, "Ignoring outcome of stale request");
                return None;
            }
        };
        self.in_flight = None;

        let message = match outcome {
            Ok(output) if output.result.mode() == in_flight.mode => {
                tracing::info!(
                    request_id = id.0,
                    mode = %in_flight.mode,
                    duration_ms = ?output.duration_ms,
                    "Generation succeeded"
                );
                ChatMessage::with_result(script::RESULT_READY, output.result)
            }
            Ok(output) => {
                tracing::warn!(
                    request_id = id.0,
                    expected = %in_flight.mode,
                    got = %output.result.mode(),
                    "Generation returned the wrong kind of result"
                );
                ChatMessage::error(script::GENERATION_FAILED)
            }
            Err(e) => {
                tracing::warn!(request_id = id.0, error = %e, "Generation failed");
                ChatMessage::error(script::GENERATION_FAILED)
            }
        };

        let index = log.replace_placeholder(message.clone());
        if index.is_none() {
            tracing::warn!(request_id = id.0, "Placeholder missing when request settled");
        }
        Some(Settlement { message, index })
    }

    /// Forget the in-flight request; its outcome will be ignored
    pub fn abandon(&mut self) -> Option<RequestId> {
        self.in_flight.take().map(|f| f.id)
    }
}

/// Call `backend`, failing with [`BackendError::Timeout`] after `timeout`
pub async fn generate_with_timeout<B>(
    backend: &B,
    request: &GenerationRequest,
    timeout: Option<Duration>,
) -> Result<GenerationOutput, BackendError>
where
    B: GenerationBackend + ?Sized,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, backend.generate(request))
            .await
            .unwrap_or_else(|_| {
                Err(BackendError::Timeout {
                    after_ms: limit.as_millis() as u64,
                })
            }),
        None => backend.generate(request).await,
    }
}
