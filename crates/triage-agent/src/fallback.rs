//! Backend selection with ordered fallback
//!
//! Candidates are tried in order; the first one that answers the probe prompt
//! wins. If none does, startup fails with [`TriageError::BackendUnavailable`],
//! the only error the workflow lets escape to its caller.

use crate::client::{OllamaClient, SharedModel};
use crate::decoder::VerdictDecoder;
use crate::structured::StructuredClient;
use std::sync::Arc;
use std::time::Duration;
use triage_core::config::ModelConfig;
use triage_core::{Result, TriageError};

/// The accepted backend: structured client plus its raw-text twin
#[derive(Clone)]
pub struct ModelPair {
    pub structured: StructuredClient,
    pub raw: SharedModel,
}

impl ModelPair {
    pub fn new(model: SharedModel) -> Self {
        Self {
            structured: StructuredClient::new(model.clone()),
            raw: model,
        }
    }

    pub fn name(&self) -> &str {
        self.raw.name()
    }

    /// Build the verdict decoder over this pair
    pub fn decoder(&self, excerpt_chars: usize) -> VerdictDecoder {
        VerdictDecoder::new(self.structured.clone(), self.raw.clone())
            .with_excerpt_chars(excerpt_chars)
    }
}

/// Try each candidate in order and return the first that answers `probe`
///
/// Probing is sequential; each attempt runs until its own request completes
/// or times out.
pub async fn connect_with_fallback<F>(
    candidates: &[String],
    probe: &str,
    factory: F,
) -> Result<ModelPair>
where
    F: Fn(&str) -> Result<SharedModel>,
{
    let mut failures = Vec::new();

    for name in candidates {
        tracing::info!(model = %name, "Trying model backend");

        let model = match factory(name) {
            Ok(model) => model,
            Err(e) => {
                tracing::warn!(model = %name, error = %e, "Could not construct backend");
                failures.push(format!("{}: {}", name, e));
                continue;
            }
        };

        match model.complete(probe).await {
            Ok(_) => {
                tracing::info!(model = %name, "Model backend accepted");
                return Ok(ModelPair::new(model));
            }
            Err(e) => {
                tracing::warn!(model = %name, error = %e, "Model backend failed probe");
                failures.push(format!("{}: {}", name, e));
            }
        }
    }

    if failures.is_empty() {
        return Err(TriageError::BackendUnavailable(
            "no candidate models configured".to_string(),
        ));
    }

    Err(TriageError::BackendUnavailable(format!(
        "all fallback models failed ({})",
        failures.join("; ")
    )))
}

/// Select among the configured Ollama candidates
pub async fn connect_ollama(config: &ModelConfig) -> Result<ModelPair> {
    let timeout = Duration::from_secs(config.timeout_secs);
    connect_with_fallback(&config.candidates, &config.probe_prompt, |name| {
        let client = OllamaClient::new(&config.base_url, name, timeout)?;
        Ok(Arc::new(client) as SharedModel)
    })
    .await
}

/// Client for the model that backs the tools and the single-shot agent
///
/// Not probed: tool calls fail open, so an absent tool model only degrades
/// their output.
pub fn tool_model(config: &ModelConfig) -> Result<SharedModel> {
    let client = OllamaClient::new(
        &config.base_url,
        config.tool_model.clone(),
        Duration::from_secs(config.timeout_secs),
    )?;
    Ok(Arc::new(client))
}
