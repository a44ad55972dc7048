//! The fixed regression check applied to every proposed fix

use crate::runner::{FixRunner, PythonRunner};
use serde_json::Value;
use std::sync::Arc;
use triage_analysis::top_level_functions;
use triage_core::config::VerificationConfig;
use triage_core::{Result, TriageError};

/// Result of checking one fix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixCheck {
    /// The fix returned the expected value
    Works,
    /// Wrong value, or the fix could not be run
    Broken { reason: String },
}

impl FixCheck {
    pub fn bug_still_present(&self) -> bool {
        matches!(self, Self::Broken { .. })
    }
}

/// Calls a fix with a fixed input and asks the runner whether the result
/// equals a fixed expectation
#[derive(Clone)]
pub struct VerificationOracle {
    runner: Arc<dyn FixRunner>,
    input: Value,
    expected: Value,
    entry_point: Option<String>,
}

impl VerificationOracle {
    pub fn new(runner: Arc<dyn FixRunner>, input: Value, expected: Value) -> Self {
        Self {
            runner,
            input,
            expected,
            entry_point: None,
        }
    }

    /// Python-backed oracle with the configured regression pair
    pub fn from_config(config: &VerificationConfig) -> Self {
        Self {
            runner: Arc::new(PythonRunner::from_config(config)),
            input: config.input.clone(),
            expected: config.expected.clone(),
            entry_point: config.entry_point.clone(),
        }
    }

    /// Always call `name` instead of the first function the fix defines
    pub fn with_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_point = Some(name.into());
        self
    }

    pub fn input(&self) -> &Value {
        &self.input
    }

    pub fn expected(&self) -> &Value {
        &self.expected
    }

    /// Name of the function a check of `fix` will call
    pub fn entry_point(&self, fix: &str) -> Result<String> {
        if let Some(name) = &self.entry_point {
            return Ok(name.clone());
        }
        top_level_functions(fix)
            .into_iter()
            .next()
            .ok_or(TriageError::NoEntryPoint)
    }

    /// Run the regression check against `fix`
    ///
    /// Never fails: errors while locating or running the fix are reported as
    /// [`FixCheck::Broken`].
    pub async fn check(&self, fix: &str) -> FixCheck {
        let result = match self.entry_point(fix) {
            Ok(entry) => self
                .runner
                .run(fix, &entry, &self.input, &self.expected)
                .await
                .map(|output| (entry, output)),
            Err(e) => Err(e),
        };

        match result {
            Ok((entry, output)) if output.matches => {
                tracing::info!(entry = %entry, result = %output.value, "Fix verified");
                FixCheck::Works
            }
            Ok((entry, output)) => {
                tracing::info!(
                    entry = %entry,
                    result = %output.value,
                    expected = %self.expected,
                    "Fix returned wrong value"
                );
                FixCheck::Broken {
                    reason: format!(
                        "{}({}) returned {}, expected {}",
                        entry, self.input, output.value, self.expected
                    ),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Fix could not be verified");
                FixCheck::Broken {
                    reason: e.to_string(),
                }
            }
        }
    }
}
