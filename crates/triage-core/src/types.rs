//! Core type definitions for triage runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Caller input, or a fix resubmitted for another pass
    Human,
    /// Output of a workflow node
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Bug severity levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    Critical,
}

impl Severity {
    /// Find the first severity word in free text
    ///
    /// Models asked for "one word" often answer with a sentence; this picks out
    /// the first recognizable label.
    pub fn find_in(text: &str) -> Option<Self> {
        text.split(|c: char| !c.is_ascii_alphabetic())
            .find_map(|word| word.parse().ok())
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Invalid severity: {}. Use low, medium, or critical.", s)),
        }
    }
}

/// The model's structured answer about a reported defect
///
/// Defaults (empty text, `false`, `low`) mean "could not determine".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub explanation: String,
    pub bug_found: bool,
    pub suggested_fix: String,
    pub severity: Severity,
}

impl Verdict {
    /// Low-confidence verdict carrying only an explanation
    pub fn undetermined(explanation: impl Into<String>) -> Self {
        Self {
            explanation: explanation.into(),
            ..Self::default()
        }
    }

    /// Trimmed fix text, if the verdict proposes one
    pub fn fix(&self) -> Option<&str> {
        let fix = self.suggested_fix.trim();
        (!fix.is_empty()).then_some(fix)
    }

    /// Serialize as the turn payload (a JSON object with the four fields)
    pub fn to_payload(&self) -> String {
        // A struct of strings, a bool and a unit enum cannot fail to serialize
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode a turn payload written by [`Verdict::to_payload`]
    pub fn from_payload(payload: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// Result of checking a proposed fix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationStatus {
    /// The fix returned the expected value
    Works,
    /// The fix produced a wrong value or failed to run
    Failed { reason: String },
    /// The fix failed and the retry budget is spent
    Exhausted { attempts: u32, reason: String },
    /// The verdict carried no fix
    NoPatch,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Works => write!(f, "Patch works!"),
            Self::Failed { reason } => write!(f, "Patch failed! ({})", reason),
            Self::Exhausted { attempts, reason } => write!(
                f,
                "Patch failed! ({}) Giving up after {} attempts.",
                reason, attempts
            ),
            Self::NoPatch => write!(f, "No patch to verify."),
        }
    }
}

/// Status plus the routing flag consumed by the next transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub status: VerificationStatus,
    pub retry: bool,
}

impl VerificationOutcome {
    pub fn works() -> Self {
        Self {
            status: VerificationStatus::Works,
            retry: false,
        }
    }

    pub fn no_patch() -> Self {
        Self {
            status: VerificationStatus::NoPatch,
            retry: false,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: VerificationStatus::Failed {
                reason: reason.into(),
            },
            retry: true,
        }
    }

    pub fn exhausted(attempts: u32, reason: impl Into<String>) -> Self {
        Self {
            status: VerificationStatus::Exhausted {
                attempts,
                reason: reason.into(),
            },
            retry: false,
        }
    }
}

/// Kinds of auxiliary outputs recorded during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Verdict,
    PatchAttempt,
    Verification,
    ExecutionPaths,
    SeverityRank,
    UnitTest,
    Summary,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verdict => write!(f, "verdict"),
            Self::PatchAttempt => write!(f, "patch_attempt"),
            Self::Verification => write!(f, "verification"),
            Self::ExecutionPaths => write!(f, "execution_paths"),
            Self::SeverityRank => write!(f, "severity_rank"),
            Self::UnitTest => write!(f, "unit_test"),
            Self::Summary => write!(f, "summary"),
        }
    }
}

/// Auxiliary output kept for diagnostics; never consulted for routing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_str() {
        assert_eq!("low".parse::<Severity>().unwrap(), Severity::Low);
        assert_eq!("MEDIUM".parse::<Severity>().unwrap(), Severity::Medium);
        assert_eq!(" Critical ".parse::<Severity>().unwrap(), Severity::Critical);
        assert!("severe".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_find_in_sentence() {
        assert_eq!(
            Severity::find_in("I would rate this as Critical."),
            Some(Severity::Critical)
        );
        assert_eq!(Severity::find_in("medium"), Some(Severity::Medium));
        assert_eq!(Severity::find_in("no idea"), None);
    }

    #[test]
    fn test_verdict_payload_is_stable_json() {
        let verdict = Verdict {
            explanation: "Returns absolute value".to_string(),
            bug_found: false,
            suggested_fix: String::new(),
            severity: Severity::Low,
        };

        let payload = verdict.to_payload();
        assert_eq!(
            payload,
            r#"{"explanation":"Returns absolute value","bug_found":false,"suggested_fix":"","severity":"low"}"#
        );
        assert_eq!(Verdict::from_payload(&payload).unwrap(), verdict);
    }

    #[test]
    fn test_verdict_fix_ignores_whitespace() {
        let mut verdict = Verdict::undetermined("x");
        assert_eq!(verdict.fix(), None);

        verdict.suggested_fix = "   \n".to_string();
        assert_eq!(verdict.fix(), None);

        verdict.suggested_fix = "  def f(x): return x\n".to_string();
        assert_eq!(verdict.fix(), Some("def f(x): return x"));
    }

    #[test]
    fn test_status_text() {
        assert_eq!(VerificationOutcome::works().status.to_string(), "Patch works!");
        assert_eq!(
            VerificationOutcome::no_patch().status.to_string(),
            "No patch to verify."
        );
        assert!(VerificationOutcome::failed("returned 2").retry);
        assert!(!VerificationOutcome::exhausted(3, "returned 2").retry);
        assert!(VerificationOutcome::exhausted(3, "returned 2")
            .status
            .to_string()
            .contains("Giving up after 3 attempts"));
    }
}
