//! Blocking client for a Gemini-style `generateContent` endpoint.

use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use ureq::Agent;

use crate::error::GenerationError;
use crate::settings::GenerationConfig;
use crate::{GenerationRequest, LanguageModel};

const GENERIC_BACKEND_ERROR: &str = "generation backend error";

pub struct GeminiClient {
    agent: Agent,
    config: GenerationConfig,
}

impl GeminiClient {
    pub fn new(config: GenerationConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent, config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn send_once(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError> {
        let body = request_body(request, &self.config);
        let mut response = self
            .agent
            .post(&self.endpoint_url())
            .query("key", request.api_key)
            .send_json(&body)
            .map_err(|err| GenerationError::Network(err.to_string()))?;

        let status = response.status().as_u16();
        let payload = response
            .body_mut()
            .read_json::<Value>()
            .unwrap_or(Value::Null);
        interpret_response(status, &payload)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.retry.base_delay_ms;
        let exponential = base.saturating_mul(1 << attempt.saturating_sub(1).min(8));
        let jitter = if base == 0 {
            0
        } else {
            rand::rng().random_range(0..=base)
        };
        Duration::from_millis(exponential.saturating_add(jitter))
    }
}

impl LanguageModel for GeminiClient {
    fn generate(&mut self, request: GenerationRequest<'_>) -> Result<String, GenerationError> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let start = Instant::now();
            let result = self.send_once(&request);
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            match result {
                Ok(text) => {
                    info!(model = %self.config.model, attempt, elapsed_ms, "generation succeeded");
                    debug!(chars = text.len(), "received completion");
                    return Ok(text);
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(attempt, ?delay, "generation failed, retrying: {err}");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => {
                    warn!(model = %self.config.model, attempt, elapsed_ms, "generation failed: {err}");
                    return Err(err);
                }
            }
        }
    }
}

/// JSON body for one `generateContent` call.
pub fn request_body(request: &GenerationRequest<'_>, config: &GenerationConfig) -> Value {
    json!({
        "contents": [{
            "parts": [
                {"text": request.system_text},
                {"text": request.user_text}
            ]
        }],
        "generationConfig": {
            "temperature": config.temperature,
            "maxOutputTokens": config.max_output_tokens
        }
    })
}

/// Maps an HTTP status and decoded body to the completion text or an error.
pub fn interpret_response(status: u16, payload: &Value) -> Result<String, GenerationError> {
    if !(200..300).contains(&status) {
        let message = payload
            .pointer("/error/message")
            .and_then(Value::as_str)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(GENERIC_BACKEND_ERROR)
            .to_string();
        return Err(GenerationError::Status { status, message });
    }

    payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
        .ok_or(GenerationError::EmptyResponse)
}
