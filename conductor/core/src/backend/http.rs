//! HTTP Backend Implementation
//!
//! Client for the generation service's REST API.
//!
//! # Service API
//!
//! - `POST /generate/` with `{"choice": "poem"|"image", "prompt": "..."}`
//!   returns `{"result": "<poem>"}` or
//!   `{"result": {"image_base64": "data:image/png;base64,...", ...}}`.
//!   A poem that failed upstream comes back as `{"result": null}`.
//! - `POST /voice-to-text/` with no body records from the server's
//!   microphone and returns `{"text": "..."}`. Any other fields in that
//!   response are ignored.

use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::traits::{
    BackendError, GenerationBackend, GenerationOutput, GenerationRequest, TranscriptionBackend,
};
use crate::session::Mode;
use crate::transcript::{GenerationResult, ImagePayload};

/// Default service address
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Longest error body kept in a [`BackendError::Status`]
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
struct GenerateBody<'a> {
    choice: &'a str,
    prompt: &'a str,
}

/// Generation and transcription over HTTP
#[derive(Clone, Debug)]
pub struct HttpBackend {
    /// Service root, without trailing slash
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http_client: reqwest::Client::new(),
        }
    }

    /// Service root
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_url(&self) -> String {
        format!("{}/generate/", self.base_url)
    }

    fn voice_url(&self) -> String {
        format!("{}/voice-to-text/", self.base_url)
    }

    async fn post_json(&self, request: reqwest::RequestBuilder) -> Result<Value, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(BackendError::Status { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Interpret the `result` field of a generate response for `mode`
fn parse_result(mode: Mode, data: &Value) -> Result<GenerationResult, BackendError> {
    let result = match data.get("result") {
        None | Some(Value::Null) => return Err(BackendError::MissingResult),
        Some(result) => result,
    };

    match mode {
        Mode::Poem => result
            .as_str()
            .map(|poem| GenerationResult::Poem(poem.to_string()))
            .ok_or_else(|| BackendError::Decode("poem result is not a string".to_string())),
        Mode::Image => result
            .get("image_base64")
            .and_then(Value::as_str)
            .map(|raw| GenerationResult::Image(ImagePayload::from_service_string(raw)))
            .ok_or_else(|| BackendError::Decode("image result has no image_base64".to_string())),
    }
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, BackendError> {
        let start = Instant::now();
        let body = GenerateBody {
            choice: request.mode.as_str(),
            prompt: &request.prompt,
        };

        tracing::debug!(mode = %request.mode, url = %self.generate_url(), "Sending generation request");
        let data = self
            .post_json(self.http_client.post(self.generate_url()).json(&body))
            .await?;

        Ok(GenerationOutput {
            result: parse_result(request.mode, &data)?,
            duration_ms: Some(start.elapsed().as_millis() as u64),
        })
    }
}

#[async_trait]
impl TranscriptionBackend for HttpBackend {
    async fn transcribe(&self) -> Result<String, BackendError> {
        let data = self.post_json(self.http_client.post(self.voice_url())).await?;

        data.get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BackendError::Decode("transcription has no text".to_string()))
    }
}
