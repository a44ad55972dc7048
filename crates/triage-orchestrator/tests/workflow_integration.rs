//! Integration tests for the triage workflow.
//!
//! A scripted model answers by prompt type and a native runner stands in for
//! the Python interpreter: fixes containing `x[1]` return the expected value.

use serde_json::{json, Value};
use std::sync::Arc;
use triage_agent::testing::ScriptedModel;
use triage_agent::ModelPair;
use triage_core::config::Strategy;
use triage_core::{ArtifactKind, Verdict};
use triage_orchestrator::{
    Debugger, NodeId, Nodes, SingleShotAgent, Triage, Workflow, WorkflowGraph, REPORT_SEPARATOR,
};
use triage_tools::ToolRegistry;
use triage_validation::{FnRunner, VerificationOracle};

const BUGGY: &str = "def pick(x):\n    return x[0]";
const GOOD_FIX: &str = "def pick(x):\n    return x[1]";
const BAD_FIX: &str = "def pick(x):\n    return x[2]";

fn verdict(explanation: &str, fix: &str) -> String {
    json!({
        "explanation": explanation,
        "bug_found": !fix.is_empty(),
        "suggested_fix": fix,
        "severity": if fix.is_empty() { "low" } else { "medium" },
    })
    .to_string()
}

fn is_verdict_prompt(prompt: &str) -> bool {
    prompt.contains("debugging assistant")
}

/// Severity and unit-test answers shared by every scenario
fn analysis_reply(prompt: &str) -> Option<String> {
    if prompt.contains("return bug severity") {
        Some("medium".to_string())
    } else if prompt.contains("test generation AI") {
        Some(r#"{"test_code": "def test_pick():\n    assert pick([1, 3, 2]) == 3"}"#.to_string())
    } else {
        None
    }
}

fn scripted<F>(verdicts: F) -> Arc<ScriptedModel>
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    Arc::new(ScriptedModel::new("scripted").with_responder(move |prompt| {
        if is_verdict_prompt(prompt) {
            Some(verdicts(prompt))
        } else {
            analysis_reply(prompt)
        }
    }))
}

fn workflow(model: Arc<ScriptedModel>) -> Workflow {
    let pair = ModelPair::new(model.clone());
    let runner = FnRunner::new(|source: &str, _entry: &str, _input: &Value| {
        Ok(if source.contains("x[1]") { json!(3) } else { json!(1) })
    });
    let oracle = VerificationOracle::new(Arc::new(runner), json!([1, 3, 2]), json!(3));
    let nodes = Nodes::new(pair.decoder(200), model, oracle).with_max_fix_attempts(3);
    Workflow::new(WorkflowGraph::standard().unwrap(), nodes)
}

fn count(path: &[NodeId], node: NodeId) -> usize {
    path.iter().filter(|n| **n == node).count()
}

#[tokio::test]
async fn test_no_fix_goes_straight_to_analysis() {
    let model = scripted(|_| verdict("Returns the absolute value of x", ""));

    let outcome = workflow(model)
        .run("def f(x): return -x if x < 0 else x")
        .await
        .unwrap();

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

    let sections: Vec<&str> = outcome.report.split(REPORT_SEPARATOR).collect();
    assert_eq!(sections.len(), 5);
    let first = Verdict::from_payload(sections[0]).unwrap();
    assert!(first.explanation.contains("absolute value"));
    assert!(!first.bug_found);
    assert_eq!(sections[1], "No patch to verify.");
    assert!(sections[2].starts_with("Simulated Execution Path:"));
    assert_eq!(sections[3], "Severity: medium");
    assert!(sections[4].starts_with("def test_pick():"));
}

#[tokio::test]
async fn test_working_fix_is_verified_once() {
    let model = scripted(|_| verdict("Returns the first element, not the largest", GOOD_FIX));

    let outcome = workflow(model).run(BUGGY).await.unwrap();

    assert_eq!(count(&outcome.path(), NodeId::BugFixer), 0);
    assert_eq!(count(&outcome.path(), NodeId::VerifyPatch), 1);
    assert!(outcome.report.contains("Patch works!"));
    assert_eq!(outcome.failed_fixes, 0);
}

#[tokio::test]
async fn test_failing_fix_stops_at_retry_cap() {
    let model = scripted(|_| verdict("Still wrong", BAD_FIX));

    let outcome = workflow(model).run(BUGGY).await.unwrap();
    let path = outcome.path();

    assert_eq!(count(&path, NodeId::VerifyPatch), 3);
    assert_eq!(count(&path, NodeId::BugFixer), 2);
    assert_eq!(count(&path, NodeId::Agent), 3);
    assert_eq!(outcome.failed_fixes, 3);
    assert!(outcome.report.contains("Giving up after 3 attempts"));
    assert_eq!(path.last(), Some(&NodeId::Summarize));
}

#[tokio::test]
async fn test_bug_fixer_never_follows_a_settled_verification() {
    // First pass proposes a broken fix, the resubmission a working one
    let model = scripted(|prompt| {
        if prompt.contains("x[0]") {
            verdict("Returns the first element", BAD_FIX)
        } else {
            verdict("Still picks the wrong index", GOOD_FIX)
        }
    });

    let outcome = workflow(model).run(BUGGY).await.unwrap();
    let path = outcome.path();

    assert_eq!(
        &path[..6],
        &[
            NodeId::Agent,
            NodeId::VerifyPatch,
            NodeId::BugFixer,
            NodeId::Agent,
            NodeId::VerifyPatch,
            NodeId::SimulatePaths,
        ]
    );

    let settled = path
        .iter()
        .rposition(|n| *n == NodeId::VerifyPatch)
        .unwrap();
    assert!(!path[settled..].contains(&NodeId::BugFixer));
    assert_eq!(outcome.failed_fixes, 1);
    assert!(outcome.report.contains("Patch works!"));
}

#[tokio::test]
async fn test_analysis_nodes_read_original_input() {
    let model = scripted(|_| verdict("Still wrong", BAD_FIX));

    let outcome = workflow(model.clone()).run(BUGGY).await.unwrap();

    let analysis_prompts: Vec<String> = model
        .calls()
        .into_iter()
        .filter(|p| p.contains("return bug severity") || p.contains("test generation AI"))
        .collect();
    assert_eq!(analysis_prompts.len(), 2);
    for prompt in &analysis_prompts {
        assert!(prompt.contains("return x[0]"));
        assert!(!prompt.contains("return x[2]"));
    }

    let paths = outcome
        .state
        .artifacts()
        .iter()
        .find(|a| a.kind == ArtifactKind::ExecutionPaths)
        .unwrap();
    assert!(paths.content.contains("x[0]"));
}

#[tokio::test]
async fn test_embedded_json_beats_excerpt() {
    let embedded = verdict("Slices the text to 100 characters in summarize", "");
    let model = Arc::new(
        ScriptedModel::new("scripted")
            .with_replies([
                "I think the function is fine.".to_string(),
                "Still not JSON.".to_string(),
                format!("Here is my answer:\n{}\nHope that helps!", embedded),
            ])
            .with_responder(analysis_reply),
    );

    let outcome = workflow(model)
        .run("def summarize(txt): return txt[:100]")
        .await
        .unwrap();

    let first = outcome.report.split(REPORT_SEPARATOR).next().unwrap();
    let decoded = Verdict::from_payload(first).unwrap();
    assert_eq!(
        decoded.explanation,
        "Slices the text to 100 characters in summarize"
    );
    assert!(outcome.report.contains("summarize"));
}

#[tokio::test]
async fn test_plain_prose_becomes_excerpt() {
    let prose = "The payload is invalid because name should be a string. ".repeat(10);
    let reply = prose.clone();
    let model = Arc::new(ScriptedModel::new("scripted").with_responder(move |prompt| {
        if is_verdict_prompt(prompt) {
            Some(reply.clone())
        } else {
            analysis_reply(prompt)
        }
    }));

    let outcome = workflow(model)
        .run(r#"{"schema": {"type": "object"}, "payload": {"name": 123}}"#)
        .await
        .unwrap();

    let first = outcome.report.split(REPORT_SEPARATOR).next().unwrap();
    let decoded = Verdict::from_payload(first).unwrap();
    assert!(!decoded.bug_found);
    assert_eq!(decoded.explanation.chars().count(), 200);
    assert!(prose.starts_with(&decoded.explanation));
    assert!(outcome.report.contains("invalid"));
}

#[tokio::test]
async fn test_debugger_reports_engine_errors_as_text() {
    let model = scripted(|_| verdict("Still wrong", BAD_FIX));
    let workflow = workflow(model.clone()).with_max_steps(4);
    let single_shot = SingleShotAgent::new(model, ToolRegistry::new());

    let debugger = Debugger::from_parts(Strategy::Graph, workflow, single_shot);
    let report = debugger.debug_tool_issue(BUGGY).await;

    assert_eq!(report, "Error: Workflow exceeded 4 steps");
}

#[tokio::test]
async fn test_debugger_single_shot_strategy() {
    let model = Arc::new(
        ScriptedModel::new("scripted").with_replies(["Final Answer: summarize truncates text"]),
    );
    let single_shot = SingleShotAgent::new(model.clone(), ToolRegistry::new());
    let debugger = Debugger::from_parts(Strategy::SingleShot, workflow(model), single_shot);

    let report = debugger
        .debug_tool_issue("def summarize(txt): return txt[:100]")
        .await;

    assert_eq!(report, "summarize truncates text");
}
