//! Conversation state threaded through every workflow node
//!
//! One state object exists per run. It is created from the caller's input,
//! owned by the in-flight run, and dropped when the report is returned.
//!
//! Two inputs are addressed independently:
//! - `original` is the caller's input and never changes, so analyses that
//!   must look at the reported code read it regardless of how many fix
//!   cycles happened
//! - `latest_verdict` points at the most recent verdict, so fix extraction
//!   and verification do not depend on which turn happens to be last

use crate::types::{Artifact, ArtifactKind, Turn, Verdict, VerificationOutcome};
use uuid::Uuid;

/// Shared state for a single triage run
#[derive(Debug, Clone)]
pub struct ConversationState {
    run_id: Uuid,
    original: Turn,
    turns: Vec<Turn>,
    artifacts: Vec<Artifact>,
    latest_verdict: Option<Verdict>,
    retry: bool,
    failed_fixes: u32,
}

impl ConversationState {
    /// Seed a fresh run with the caller's input as the first human turn
    pub fn new(input: impl Into<String>) -> Self {
        let original = Turn::human(input);
        Self {
            run_id: Uuid::new_v4(),
            turns: vec![original.clone()],
            original,
            artifacts: Vec::new(),
            latest_verdict: None,
            retry: false,
            failed_fixes: 0,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The caller's input, unchanged for the lifetime of the run
    pub fn original(&self) -> &Turn {
        &self.original
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Most recent turn; the input of the next node
    pub fn last_turn(&self) -> &Turn {
        // `turns` is seeded non-empty and every replacement installs a turn
        self.turns.last().unwrap_or(&self.original)
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn latest_verdict(&self) -> Option<&Verdict> {
        self.latest_verdict.as_ref()
    }

    pub fn retry(&self) -> bool {
        self.retry
    }

    pub fn failed_fixes(&self) -> u32 {
        self.failed_fixes
    }

    /// Append a turn to the conversation
    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Record an auxiliary output
    pub fn push_artifact(&mut self, kind: ArtifactKind, content: impl Into<String>) {
        self.artifacts.push(Artifact::new(kind, content));
    }

    /// Append a verdict as an assistant turn and make it the latest verdict
    pub fn record_verdict(&mut self, verdict: Verdict) {
        let payload = verdict.to_payload();
        self.turns.push(Turn::assistant(payload.clone()));
        self.artifacts.push(Artifact::new(ArtifactKind::Verdict, payload));
        self.latest_verdict = Some(verdict);
    }

    /// Append a verification status turn and set the routing flag
    pub fn record_verification(&mut self, outcome: &VerificationOutcome) {
        let status = outcome.status.to_string();
        self.turns.push(Turn::assistant(status.clone()));
        self.artifacts
            .push(Artifact::new(ArtifactKind::Verification, status));
        self.retry = outcome.retry;
    }

    pub fn clear_retry(&mut self) {
        self.retry = false;
    }

    /// Count a fix that failed verification, returning the new total
    pub fn note_failed_fix(&mut self) -> u32 {
        self.failed_fixes += 1;
        self.failed_fixes
    }

    /// Replace the turn history with a resubmitted fix
    ///
    /// The original input and the artifact log are kept.
    pub fn restart_with(&mut self, fix: impl Into<String>) {
        let fix = fix.into();
        self.artifacts
            .push(Artifact::new(ArtifactKind::PatchAttempt, fix.clone()));
        self.turns = vec![Turn::human(fix)];
    }

    /// Payloads of every assistant turn, oldest first
    pub fn assistant_payloads(&self) -> impl Iterator<Item = &str> {
        self.turns
            .iter()
            .filter(|t| t.is_assistant())
            .map(|t| t.content.as_str())
    }

    /// Replace the whole turn history with a single summary turn
    pub fn collapse_into(&mut self, summary: impl Into<String>) {
        let summary = summary.into();
        self.artifacts
            .push(Artifact::new(ArtifactKind::Summary, summary.clone()));
        self.turns = vec![Turn::assistant(summary)];
    }
}
