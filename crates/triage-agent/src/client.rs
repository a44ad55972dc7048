//! Model backend client
//!
//! Every call is a single stateless prompt/response exchange. The workflow
//! keeps its own conversation state; the backend never sees history.

use crate::circuit_breaker::CircuitBreaker;
use crate::types::{GenerateRequest, GenerateResponse};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use triage_core::{Result, TriageError};

// Retry configuration for transient backend errors
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// A text-completion backend reachable by name
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Backend model identifier
    fn name(&self) -> &str;

    /// Plain text completion
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Completion constrained to a JSON document where the backend supports it
    async fn complete_json(&self, prompt: &str) -> Result<String> {
        self.complete(prompt).await
    }
}

/// Shared handle to a backend, passed into every component that needs one
pub type SharedModel = Arc<dyn LanguageModel>;

/// Client for an Ollama server's `/api/generate` endpoint
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    initial_backoff: Duration,
}

impl OllamaClient {
    /// Create a client for `model` served at `base_url`
    pub fn new(base_url: &str, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TriageError::Api(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.into(),
            breaker: Arc::new(CircuitBreaker::default()),
            max_retries: MAX_RETRIES,
            initial_backoff: INITIAL_BACKOFF,
        })
    }

    /// Override the retry policy for transient errors
    pub fn with_retry_policy(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.initial_backoff = initial_backoff;
        self
    }

    /// Replace the circuit breaker (shared between clones)
    pub fn with_circuit_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = Arc::new(breaker);
        self
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn generate(&self, prompt: &str, format: Option<&str>) -> Result<String> {
        self.breaker.check(&self.model)?;

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: format.map(str::to_string),
        };

        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            tracing::debug!(
                model = %self.model,
                json = format.is_some(),
                "Sending generate request (attempt {})",
                retries + 1
            );

            let response = match self.http.post(&self.endpoint).json(&request).send().await {
                Ok(response) => response,
                Err(e) => {
                    self.breaker.record_failure();
                    return Err(TriageError::Api(format!(
                        "Failed to reach {}: {}",
                        self.endpoint, e
                    )));
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let error_text = response.text().await.unwrap_or_default();
                if retries < self.max_retries {
                    retries += 1;
                    tracing::warn!(
                        "Backend error ({}). Waiting {:?} before retry {}/{}",
                        status,
                        backoff,
                        retries,
                        self.max_retries
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    continue;
                }

                self.breaker.record_failure();
                return Err(TriageError::ApiLimit(format!(
                    "{} still failing after {} retries ({}): {}",
                    self.model, self.max_retries, status, error_text
                )));
            }

            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                let failures = self.breaker.record_failure();
                tracing::error!(model = %self.model, failures, "Backend request rejected");
                return Err(TriageError::Api(format!(
                    "Ollama error {} for {}: {}",
                    status, self.model, error_text
                )));
            }

            let generated: GenerateResponse = response
                .json()
                .await
                .map_err(|e| TriageError::Api(format!("Failed to parse response: {}", e)))?;

            self.breaker.record_success();

            match generated.usage() {
                Some(usage) => tracing::info!(
                    "{} replied ({} chars, {} input tokens, {} output tokens)",
                    self.model,
                    generated.response.len(),
                    usage.input_tokens,
                    usage.output_tokens
                ),
                None => tracing::info!(
                    "{} replied ({} chars)",
                    self.model,
                    generated.response.len()
                ),
            }

            return Ok(generated.response);
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.generate(prompt, None).await
    }

    async fn complete_json(&self, prompt: &str) -> Result<String> {
        self.generate(prompt, Some("json")).await
    }
}
