//! Fix runners: execute a named function from candidate source

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use triage_core::config::VerificationConfig;
use triage_core::{Result, TriageError};

/// What a fix returned, and whether the runner judged it equal to the
/// expected value
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunOutput {
    #[serde(rename = "result")]
    pub value: Value,
    #[serde(rename = "equal")]
    pub matches: bool,
}

/// Executes `entry(input)` from candidate source and compares the result
/// with `expected`
#[async_trait]
pub trait FixRunner: Send + Sync {
    async fn run(
        &self,
        source: &str,
        entry: &str,
        input: &Value,
        expected: &Value,
    ) -> Result<RunOutput>;
}

// Reads the fix from stdin, runs it in a fresh namespace, calls the entry
// point with the JSON-decoded input and compares with `==` in the
// interpreter. Prints {"result": ..., "equal": ...} as JSON.
const HARNESS: &str = r#"
import json, sys
source = sys.stdin.read()
namespace = {"__name__": "__fix__"}
exec(compile(source, "<fix>", "exec"), namespace)
entry = namespace.get(sys.argv[1])
if not callable(entry):
    raise NameError("fix does not define a callable named %r" % sys.argv[1])
result = entry(json.loads(sys.argv[2]))
equal = bool(result == json.loads(sys.argv[3]))
print(json.dumps({"result": result, "equal": equal}, default=repr))
"#;

// Stderr kept in a failure reason
const MAX_REASON_CHARS: usize = 300;

/// Runs fixes in a fresh Python interpreter process per call
#[derive(Debug, Clone)]
pub struct PythonRunner {
    python: String,
    timeout: Duration,
}

impl PythonRunner {
    pub fn new(python: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python: python.into(),
            timeout,
        }
    }

    pub fn from_config(config: &VerificationConfig) -> Self {
        Self::new(&config.python, Duration::from_secs(config.timeout_secs))
    }

    /// Whether the configured interpreter can be started
    pub async fn is_available(&self) -> bool {
        Command::new(&self.python)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn execute(
        &self,
        source: &str,
        entry: &str,
        input: &Value,
        expected: &Value,
    ) -> Result<RunOutput> {
        let mut child = Command::new(&self.python)
            .arg("-c")
            .arg(HARNESS)
            .arg(entry)
            .arg(input.to_string())
            .arg(expected.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TriageError::Verification(format!("failed to start {}: {}", self.python, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes()).await?;
            // Dropping stdin closes the pipe so the harness sees EOF
        }

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("interpreter exited with an error")
                .trim();
            return Err(TriageError::Verification(
                reason.chars().take(MAX_REASON_CHARS).collect(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let last_line = stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("");

        serde_json::from_str(last_line).map_err(|e| {
            TriageError::Verification(format!("unreadable result {:?}: {}", last_line, e))
        })
    }
}

#[async_trait]
impl FixRunner for PythonRunner {
    async fn run(
        &self,
        source: &str,
        entry: &str,
        input: &Value,
        expected: &Value,
    ) -> Result<RunOutput> {
        let execution = self.execute(source, entry, input, expected);
        match tokio::time::timeout(self.timeout, execution).await {
            Ok(result) => result,
            Err(_) => Err(TriageError::Verification(format!(
                "timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

/// Adapts a plain function into a runner
///
/// Lets callers supply the callable directly instead of executing source,
/// e.g. to check fixes for a native implementation. Results are compared
/// with the expected value as JSON.
pub struct FnRunner<F> {
    f: F,
}

impl<F> FnRunner<F>
where
    F: Fn(&str, &str, &Value) -> Result<Value> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> FixRunner for FnRunner<F>
where
    F: Fn(&str, &str, &Value) -> Result<Value> + Send + Sync,
{
    async fn run(
        &self,
        source: &str,
        entry: &str,
        input: &Value,
        expected: &Value,
    ) -> Result<RunOutput> {
        let value = (self.f)(source, entry, input)?;
        let matches = value == *expected;
        Ok(RunOutput { value, matches })
    }
}
