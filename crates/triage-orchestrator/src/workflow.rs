//! The run loop: execute nodes along the graph until the finish node

use crate::activity_logger::ActivityLogger;
use crate::graph::{NodeId, WorkflowGraph};
use crate::nodes::Nodes;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use triage_core::{ConversationState, Result, TriageError};

const DEFAULT_MAX_STEPS: usize = 64;

/// Wall-clock time of one node execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTiming {
    pub node: NodeId,
    pub elapsed: Duration,
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The summary turn
    pub report: String,
    /// Node executions in order
    pub trace: Vec<NodeTiming>,
    pub failed_fixes: u32,
    pub state: ConversationState,
}

impl RunOutcome {
    /// Nodes in execution order
    pub fn path(&self) -> Vec<NodeId> {
        self.trace.iter().map(|t| t.node).collect()
    }

    pub fn total_elapsed(&self) -> Duration {
        self.trace.iter().map(|t| t.elapsed).sum()
    }
}

/// Graph plus node bodies; one instance serves any number of runs
#[derive(Clone)]
pub struct Workflow {
    graph: WorkflowGraph,
    nodes: Nodes,
    max_steps: usize,
    logger: Option<ActivityLogger>,
}

impl Workflow {
    /// The step guard starts high enough for `nodes` to exhaust its fix
    /// attempts
    pub fn new(graph: WorkflowGraph, nodes: Nodes) -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS.max(nodes.exhaustive_run_steps()),
            graph,
            nodes,
            logger: None,
        }
    }

    /// Abort a run after exactly this many node executions
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Abort after `max_steps`, but never before the fix attempts run out
    pub fn with_step_guard(self, max_steps: usize) -> Self {
        let needed = self.nodes.exhaustive_run_steps();
        self.with_max_steps(max_steps.max(needed))
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn with_activity_log(mut self, logger: ActivityLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// Run the graph over a fresh state seeded with `input`
    ///
    /// Only a tripped step guard is an error; node failures are part of the
    /// report.
    pub async fn run(&self, input: &str) -> Result<RunOutcome> {
        let mut state = ConversationState::new(input);
        let mut trace = Vec::new();
        let mut node = self.graph.entry();

        info!(run_id = %state.run_id(), "Starting triage run");

        loop {
            if trace.len() >= self.max_steps {
                warn!(run_id = %state.run_id(), steps = trace.len(), "Step limit reached");
                return Err(TriageError::StepLimit(self.max_steps));
            }

            let started = Instant::now();
            self.nodes.run(node, &mut state).await;
            let elapsed = started.elapsed();

            debug!(
                node = %node,
                elapsed_ms = elapsed.as_millis() as u64,
                retry = state.retry(),
                "Node finished"
            );
            trace.push(NodeTiming { node, elapsed });

            match self.graph.next(node, state.retry()) {
                Some(next) => node = next,
                None => break,
            }
        }

        let outcome = RunOutcome {
            report: state.last_turn().content.clone(),
            failed_fixes: state.failed_fixes(),
            trace,
            state,
        };

        info!(
            run_id = %outcome.state.run_id(),
            steps = outcome.trace.len(),
            failed_fixes = outcome.failed_fixes,
            elapsed_ms = outcome.total_elapsed().as_millis() as u64,
            "Triage run complete"
        );

        if let Some(logger) = &self.logger {
            logger.log_run(input, &outcome).await;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use triage_agent::testing::ScriptedModel;
    use triage_agent::ModelPair;
    use triage_validation::{FnRunner, VerificationOracle};

    fn nodes(model: ScriptedModel) -> Nodes {
        let model = Arc::new(model);
        let pair = ModelPair::new(model.clone());
        let runner = FnRunner::new(|_: &str, _: &str, _: &Value| Ok(json!(1)));
        let oracle = VerificationOracle::new(Arc::new(runner), json!([1, 3, 2]), json!(3));
        Nodes::new(pair.decoder(200), model, oracle)
    }

    fn workflow(model: ScriptedModel) -> Workflow {
        Workflow::new(WorkflowGraph::standard().unwrap(), nodes(model))
    }

    // Every verdict proposes a fix the runner rejects
    fn always_failing_fix() -> ScriptedModel {
        let verdict = json!({
            "explanation": "Off by one",
            "bug_found": true,
            "suggested_fix": "def f(x): return x[0]",
            "severity": "medium",
        })
        .to_string();
        ScriptedModel::new("m").with_responder(move |_| Some(verdict.clone()))
    }

    #[tokio::test]
    async fn test_step_limit_is_an_error() {
        let model = ScriptedModel::new("m").with_responder(|_| Some("not json".to_string()));
        let err = workflow(model).with_max_steps(3).run("input").await.unwrap_err();
        assert!(matches!(err, TriageError::StepLimit(3)));
    }

    #[tokio::test]
    async fn test_large_fix_cap_reaches_summary() {
        let nodes = nodes(always_failing_fix()).with_max_fix_attempts(25);
        let workflow = Workflow::new(WorkflowGraph::standard().unwrap(), nodes);
        assert_eq!(workflow.max_steps(), 82);

        let outcome = workflow.run("def f(x): return x[0]").await.unwrap();

        assert_eq!(outcome.failed_fixes, 25);
        assert_eq!(outcome.path().last(), Some(&NodeId::Summarize));
        assert!(outcome.path().contains(&NodeId::SimulatePaths));
        assert!(outcome.report.contains("Giving up after 25 attempts"));
    }

    #[test]
    fn test_step_guard_never_undercuts_fix_cap() {
        let nodes = nodes(always_failing_fix()).with_max_fix_attempts(25);
        let workflow = Workflow::new(WorkflowGraph::standard().unwrap(), nodes);

        assert_eq!(workflow.clone().with_step_guard(64).max_steps(), 82);
        assert_eq!(workflow.with_step_guard(200).max_steps(), 200);
    }

    #[tokio::test]
    async fn test_backend_failures_still_produce_report() {
        let outcome = workflow(ScriptedModel::new("m")).run("def f(x): return x").await.unwrap();

        assert_eq!(
            outcome.path(),
            vec![
                NodeId::Agent,
                NodeId::VerifyPatch,
                NodeId::SimulatePaths,
                NodeId::RankSeverity,
                NodeId::GenerateTests,
                NodeId::Summarize,
            ]
        );
        assert!(outcome.report.contains("Fallback completion failed"));
        assert!(outcome.report.contains("Severity: unknown"));
        assert_eq!(outcome.state.turns().len(), 1);
    }
}
