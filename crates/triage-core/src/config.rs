//! Configuration management for triage
//!
//! This module provides configuration structures for the model backend,
//! workflow limits, fix verification, auxiliary services and the entry
//! strategy. Values come from `.triage/config.toml` when present, then
//! environment overrides are applied on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Result, TriageError};

/// Environment flag selecting the graph workflow (`true`, `1`, `yes`)
pub const USE_GRAPH_ENV: &str = "TRIAGE_USE_GRAPH";

/// Environment override for the model backend URL
pub const OLLAMA_URL_ENV: &str = "TRIAGE_OLLAMA_URL";

/// Top-level triage configuration
///
/// Loaded from `.triage/config.toml` in the working directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Which top-level entry strategy answers requests
    #[serde(default)]
    pub strategy: Strategy,

    /// Model backend selection
    #[serde(default)]
    pub model: ModelConfig,

    /// Workflow limits
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Fix verification harness
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Auxiliary HTTP services
    #[serde(default)]
    pub services: ServicesConfig,
}

/// Model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Candidate models, tried in order until one answers the probe
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,

    /// Model used by the tool-calling helpers
    #[serde(default = "default_tool_model")]
    pub tool_model: String,

    /// Per-request timeout
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,

    /// Prompt used as the liveness probe during fallback
    #[serde(default = "default_probe_prompt")]
    pub probe_prompt: String,
}

/// Workflow limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Failed verifications allowed before giving up on fixes
    #[serde(default = "default_max_fix_attempts")]
    pub max_fix_attempts: u32,

    /// Characters of raw model output kept when no JSON can be recovered
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,

    /// Hard guard on node executions per run, raised to whatever
    /// `max_fix_attempts` needs to run out
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Append a per-run entry to `.triage/activity.md`
    #[serde(default)]
    pub activity_log: bool,
}

/// Fix verification harness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Interpreter used to run candidate fixes
    #[serde(default = "default_python")]
    pub python: String,

    /// Fixed regression input passed to the fix
    #[serde(default = "default_verification_input")]
    pub input: serde_json::Value,

    /// Value the fix must return for the input
    #[serde(default = "default_verification_expected")]
    pub expected: serde_json::Value,

    /// Wall-clock limit for one verification run
    #[serde(default = "default_verification_timeout")]
    pub timeout_secs: u64,

    /// Function to call instead of the first one defined in the fix
    #[serde(default)]
    pub entry_point: Option<String>,
}

/// Auxiliary HTTP services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Function-signature parser endpoint
    #[serde(default = "default_code_parser_url")]
    pub code_parser_url: String,

    /// JSON payload validator endpoint
    #[serde(default = "default_json_validator_url")]
    pub json_validator_url: String,

    /// Per-request timeout
    #[serde(default = "default_service_timeout")]
    pub timeout_secs: u64,
}

/// Top-level entry strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Multi-node workflow with fix verification
    #[default]
    Graph,
    /// Single tool-using agent pass
    SingleShot,
}

impl Strategy {
    /// Interpret a boolean-like flag value (`true`/`1`/`yes` selects the graph)
    pub fn from_flag(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Self::Graph,
            _ => Self::SingleShot,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Graph => write!(f, "graph"),
            Self::SingleShot => write!(f, "single-shot"),
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "graph" => Ok(Self::Graph),
            "single-shot" | "single_shot" | "singleshot" => Ok(Self::SingleShot),
            _ => Err(format!("Invalid strategy: {}. Use graph or single-shot.", s)),
        }
    }
}

// Default value providers
fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_candidates() -> Vec<String> {
    vec!["phi3:mini".to_string(), "mistral".to_string()]
}

fn default_tool_model() -> String {
    "mistral".to_string()
}

fn default_model_timeout() -> u64 {
    20
}

fn default_probe_prompt() -> String {
    "def foo(): return 42".to_string()
}

fn default_max_fix_attempts() -> u32 {
    3
}

fn default_excerpt_chars() -> usize {
    200
}

fn default_max_steps() -> usize {
    64
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_verification_input() -> serde_json::Value {
    serde_json::json!([1, 3, 2])
}

fn default_verification_expected() -> serde_json::Value {
    serde_json::json!(3)
}

fn default_verification_timeout() -> u64 {
    10
}

fn default_code_parser_url() -> String {
    "http://localhost:8000/parse-function/".to_string()
}

fn default_json_validator_url() -> String {
    "http://localhost:8001/validate-json/".to_string()
}

fn default_service_timeout() -> u64 {
    10
}

impl TriageConfig {
    /// Path of the config file under a root directory
    pub fn path(root: &Path) -> PathBuf {
        root.join(".triage/config.toml")
    }

    /// Load configuration from `.triage/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = Self::path(root);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)
                .map_err(|e| TriageError::Config(format!("Failed to parse config file: {}", e)))
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration and apply environment overrides
    pub fn load(root: &Path) -> Result<Self> {
        let mut config = Self::load_or_default(root)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(flag) = lookup(USE_GRAPH_ENV) {
            self.strategy = Strategy::from_flag(&flag);
        }
        if let Some(url) = lookup(OLLAMA_URL_ENV) {
            if !url.trim().is_empty() {
                self.model.base_url = url.trim().to_string();
            }
        }
    }

    /// Write default configuration to `.triage/config.toml`
    pub fn write_default(root: &Path) -> Result<PathBuf> {
        let config_dir = root.join(".triage");
        std::fs::create_dir_all(&config_dir)?;

        let config_path = Self::path(root);
        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| TriageError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, content)?;
        Ok(config_path)
    }

    /// Path of the activity log, if enabled
    pub fn activity_log_path(&self, root: &Path) -> Option<PathBuf> {
        self.workflow
            .activity_log
            .then(|| root.join(".triage/activity.md"))
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            candidates: default_candidates(),
            tool_model: default_tool_model(),
            timeout_secs: default_model_timeout(),
            probe_prompt: default_probe_prompt(),
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_fix_attempts: default_max_fix_attempts(),
            excerpt_chars: default_excerpt_chars(),
            max_steps: default_max_steps(),
            activity_log: false,
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            input: default_verification_input(),
            expected: default_verification_expected(),
            timeout_secs: default_verification_timeout(),
            entry_point: None,
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            code_parser_url: default_code_parser_url(),
            json_validator_url: default_json_validator_url(),
            timeout_secs: default_service_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TriageConfig::default();
        assert_eq!(config.model.candidates, vec!["phi3:mini", "mistral"]);
        assert_eq!(config.model.timeout_secs, 20);
        assert_eq!(config.workflow.max_fix_attempts, 3);
        assert_eq!(config.workflow.excerpt_chars, 200);
        assert_eq!(config.verification.input, serde_json::json!([1, 3, 2]));
        assert_eq!(config.verification.expected, serde_json::json!(3));
        assert_eq!(config.strategy, Strategy::Graph);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TriageConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.model.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_write_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = TriageConfig::write_default(dir.path()).unwrap();
        assert!(path.exists());

        let config = TriageConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.workflow.max_steps, 64);
        assert_eq!(config.services.timeout_secs, 10);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".triage")).unwrap();
        std::fs::write(
            TriageConfig::path(dir.path()),
            "strategy = \"single_shot\"\n\n[workflow]\nmax_fix_attempts = 5\n",
        )
        .unwrap();

        let config = TriageConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.strategy, Strategy::SingleShot);
        assert_eq!(config.workflow.max_fix_attempts, 5);
        assert_eq!(config.workflow.excerpt_chars, 200);
        assert_eq!(config.model.tool_model, "mistral");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".triage")).unwrap();
        std::fs::write(TriageConfig::path(dir.path()), "model = 12").unwrap();

        let err = TriageConfig::load_or_default(dir.path()).unwrap_err();
        assert!(matches!(err, TriageError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = TriageConfig::default();
        config.apply_env_overrides(|key| match key {
            USE_GRAPH_ENV => Some("no".to_string()),
            OLLAMA_URL_ENV => Some("http://ollama:11434".to_string()),
            _ => None,
        });
        assert_eq!(config.strategy, Strategy::SingleShot);
        assert_eq!(config.model.base_url, "http://ollama:11434");

        config.apply_env_overrides(|key| (key == USE_GRAPH_ENV).then(|| "YES".to_string()));
        assert_eq!(config.strategy, Strategy::Graph);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("graph".parse::<Strategy>().unwrap(), Strategy::Graph);
        assert_eq!("single-shot".parse::<Strategy>().unwrap(), Strategy::SingleShot);
        assert!("legacy".parse::<Strategy>().is_err());
    }
}
