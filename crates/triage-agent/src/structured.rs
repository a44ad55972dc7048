//! Schema-constrained verdict completion
//!
//! The structured client asks the backend for a JSON verdict, decodes it
//! strictly, and on mismatch gives the model one chance to repair its own
//! output before reporting failure.

use crate::client::SharedModel;
use crate::extract::{fix_json_issues, strip_markdown_fences};
use crate::prompt::{build_repair_prompt, build_verdict_prompt};
use crate::types::DecodeTier;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use triage_core::{Result, Severity, TriageError, Verdict};

/// Verdict as it appears on the wire; every field is required, and
/// `suggested_fix` may be null
#[derive(Debug, Deserialize)]
struct VerdictWire {
    explanation: String,
    #[serde(deserialize_with = "deserialize_bool_like")]
    bug_found: bool,
    // deserialize_with turns off the implicit None for a missing key
    #[serde(deserialize_with = "deserialize_nullable")]
    suggested_fix: Option<String>,
    severity: String,
}

impl TryFrom<VerdictWire> for Verdict {
    type Error = TriageError;

    fn try_from(wire: VerdictWire) -> Result<Self> {
        let severity = wire
            .severity
            .parse::<Severity>()
            .map_err(TriageError::Decode)?;
        Ok(Verdict {
            explanation: wire.explanation,
            bug_found: wire.bug_found,
            suggested_fix: wire.suggested_fix.unwrap_or_default(),
            severity,
        })
    }
}

/// Interpret booleans, bool-like strings and 0/1 as a flag
pub fn bool_like(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn deserialize_bool_like<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    bool_like(&value)
        .ok_or_else(|| de::Error::custom(format!("expected a boolean, got {}", value)))
}

fn deserialize_nullable<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

/// Strictly decode a verdict: all four fields present and well-typed
pub fn decode_strict(text: &str) -> Result<Verdict> {
    let clean = fix_json_issues(strip_markdown_fences(text));
    let wire: VerdictWire =
        serde_json::from_str(&clean).map_err(|e| TriageError::Decode(e.to_string()))?;
    Verdict::try_from(wire)
}

/// Decode whatever verdict fields a JSON object carries, defaulting the rest
///
/// Returns `None` when the text is not a JSON object at all.
pub fn decode_lenient(text: &str) -> Option<Verdict> {
    let value: Value = serde_json::from_str(&fix_json_issues(text)).ok()?;
    let object = value.as_object()?;

    let text_field = |name: &str| match object.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    Some(Verdict {
        explanation: text_field("explanation"),
        bug_found: object
            .get("bug_found")
            .and_then(bool_like)
            .unwrap_or(false),
        suggested_fix: text_field("suggested_fix"),
        severity: object
            .get("severity")
            .and_then(Value::as_str)
            .and_then(Severity::find_in)
            .unwrap_or_default(),
    })
}

/// Verdict completion with strict decode and one self-repair pass
#[derive(Clone)]
pub struct StructuredClient {
    model: SharedModel,
}

impl StructuredClient {
    pub fn new(model: SharedModel) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Ask for a verdict about `input`
    ///
    /// Errors when the backend call fails or when neither the first answer
    /// nor the repaired one satisfies the schema.
    pub async fn invoke(&self, input: &str) -> Result<(Verdict, DecodeTier)> {
        let raw = self.model.complete_json(&build_verdict_prompt(input)).await?;

        let error = match decode_strict(&raw) {
            Ok(verdict) => return Ok((verdict, DecodeTier::Structured)),
            Err(e) => e,
        };

        tracing::debug!(
            model = %self.model.name(),
            error = %error,
            "Structured verdict rejected, asking for repair"
        );

        let repaired = self
            .model
            .complete_json(&build_repair_prompt(&raw, &error.to_string()))
            .await?;

        decode_strict(&repaired).map(|verdict| (verdict, DecodeTier::Repaired))
    }
}
