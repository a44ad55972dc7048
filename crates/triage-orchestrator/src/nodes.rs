//! Node bodies
//!
//! Every node reads from and writes to the shared [`ConversationState`] and
//! never returns an error: failures are folded into the state as text.

use crate::graph::NodeId;
use triage_agent::prompt::{build_severity_prompt, build_unit_test_prompt};
use triage_agent::{SharedModel, VerdictDecoder};
use triage_analysis::{parse_generated_test, simulate_paths, sketch_test};
use triage_core::{ArtifactKind, ConversationState, Severity, Turn, VerificationOutcome};
use triage_validation::{FixCheck, VerificationOracle};

/// Separator between sections of the final report
pub const REPORT_SEPARATOR: &str = "\n\n---\n\n";

const DEFAULT_MAX_FIX_ATTEMPTS: u32 = 3;

/// The collaborators node bodies call into
#[derive(Clone)]
pub struct Nodes {
    decoder: VerdictDecoder,
    model: SharedModel,
    oracle: VerificationOracle,
    max_fix_attempts: u32,
}

impl Nodes {
    /// `model` answers the severity and unit-test prompts
    pub fn new(decoder: VerdictDecoder, model: SharedModel, oracle: VerificationOracle) -> Self {
        Self {
            decoder,
            model,
            oracle,
            max_fix_attempts: DEFAULT_MAX_FIX_ATTEMPTS,
        }
    }

    /// Failed verifications allowed before the run stops retrying fixes
    pub fn with_max_fix_attempts(mut self, attempts: u32) -> Self {
        self.max_fix_attempts = attempts.max(1);
        self
    }

    pub fn max_fix_attempts(&self) -> u32 {
        self.max_fix_attempts
    }

    /// Node executions a run needs when every fix attempt fails
    ///
    /// Each failed attempt costs agent, verify_patch and bug_fixer; the
    /// remaining nodes run once each.
    pub fn exhaustive_run_steps(&self) -> usize {
        3 * self.max_fix_attempts as usize + NodeId::ALL.len()
    }

    /// Execute one node against the state
    pub async fn run(&self, node: NodeId, state: &mut ConversationState) {
        match node {
            NodeId::Agent => self.agent(state).await,
            NodeId::BugFixer => self.bug_fixer(state),
            NodeId::VerifyPatch => self.verify_patch(state).await,
            NodeId::SimulatePaths => self.simulate_paths(state),
            NodeId::RankSeverity => self.rank_severity(state).await,
            NodeId::GenerateTests => self.generate_tests(state).await,
            NodeId::Summarize => self.summarize(state),
        }
    }

    async fn agent(&self, state: &mut ConversationState) {
        let input = state.last_turn().content.clone();
        let decoded = self.decoder.decode(&input).await;

        tracing::debug!(
            tier = ?decoded.tier,
            bug_found = decoded.verdict.bug_found,
            "Verdict decoded"
        );

        state.record_verdict(decoded.verdict);
        state.clear_retry();
    }

    fn bug_fixer(&self, state: &mut ConversationState) {
        let fix = state
            .latest_verdict()
            .and_then(|verdict| verdict.fix())
            .map(str::to_string);

        match fix {
            Some(fix) => {
                tracing::info!(attempt = state.failed_fixes(), "Resubmitting fix");
                state.restart_with(fix);
            }
            None => tracing::warn!("No fix to resubmit, passing state through"),
        }
    }

    async fn verify_patch(&self, state: &mut ConversationState) {
        let fix = state
            .latest_verdict()
            .and_then(|verdict| verdict.fix())
            .map(str::to_string);

        let outcome = match fix {
            None => VerificationOutcome::no_patch(),
            Some(fix) => match self.oracle.check(&fix).await {
                FixCheck::Works => VerificationOutcome::works(),
                FixCheck::Broken { reason } => {
                    let failures = state.note_failed_fix();
                    if failures >= self.max_fix_attempts {
                        tracing::warn!(failures, "Fix attempts exhausted");
                        VerificationOutcome::exhausted(failures, reason)
                    } else {
                        VerificationOutcome::failed(reason)
                    }
                }
            },
        };

        tracing::info!(status = %outcome.status, retry = outcome.retry, "Patch verified");
        state.record_verification(&outcome);
    }

    fn simulate_paths(&self, state: &mut ConversationState) {
        let paths = simulate_paths(&state.original().content);
        state.push_artifact(ArtifactKind::ExecutionPaths, paths.clone());
        state.push_turn(Turn::assistant(paths));
    }

    async fn rank_severity(&self, state: &mut ConversationState) {
        let prompt = build_severity_prompt(&state.original().content);

        let label = match self.model.complete(&prompt).await {
            Ok(reply) => match Severity::find_in(&reply) {
                Some(severity) => severity.to_string(),
                None => reply.trim().to_lowercase(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Severity ranking failed");
                format!("unknown ({})", e)
            }
        };

        let ranked = format!("Severity: {}", label);
        state.push_artifact(ArtifactKind::SeverityRank, ranked.clone());
        state.push_turn(Turn::assistant(ranked));
    }

    async fn generate_tests(&self, state: &mut ConversationState) {
        let code = state.original().content.clone();

        let test = match self.model.complete(&build_unit_test_prompt(&code)).await {
            Ok(reply) => parse_generated_test(&reply),
            Err(e) => {
                tracing::warn!(error = %e, "Test generation failed");
                sketch_test(&code, &e.to_string())
            }
        };

        state.push_artifact(ArtifactKind::UnitTest, test.clone());
        state.push_turn(Turn::assistant(test));
    }

    fn summarize(&self, state: &mut ConversationState) {
        let summary = state
            .assistant_payloads()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(REPORT_SEPARATOR);
        state.collapse_into(summary);
    }
}
