//! Clients for the auxiliary HTTP services
//!
//! Both services take a JSON body and answer with text that is passed through
//! unchanged.

use serde_json::{json, Value};
use std::time::Duration;
use triage_core::config::ServicesConfig;
use triage_core::{Result, TriageError};

/// Client for the code-parser and JSON-validator services
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    code_parser_url: String,
    json_validator_url: String,
}

impl ServiceClient {
    pub fn new(config: &ServicesConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TriageError::Service(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            code_parser_url: config.code_parser_url.clone(),
            json_validator_url: config.json_validator_url.clone(),
        })
    }

    /// Function name, arguments and docstring of `code`, as the service reports them
    pub async fn parse_function(&self, code: &str) -> Result<String> {
        let text = self
            .post(&self.code_parser_url, &json!({ "code": code }))
            .await?;
        if text.trim().is_empty() {
            return Ok("Empty response from Code Parser".to_string());
        }
        Ok(text)
    }

    /// Validation result for a `{"schema": ..., "payload": ...}` request
    pub async fn validate_json(&self, request: &Value) -> Result<String> {
        self.post(&self.json_validator_url, request).await
    }

    async fn post(&self, url: &str, body: &Value) -> Result<String> {
        tracing::debug!(url = %url, "Calling auxiliary service");

        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TriageError::Service(format!("{}: {}", url, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TriageError::Service(format!("{}: failed to read body: {}", url, e)))?;

        if status.is_server_error() {
            return Err(TriageError::Service(format!("{} returned {}: {}", url, status, text)));
        }

        // Client errors carry the validator's findings in the body
        Ok(text)
    }
}
