//! Tools available to the single-shot agent
//!
//! A tool takes text and returns text. Failures are folded into the returned
//! text so the agent can read them like any other observation.

use crate::services::ServiceClient;
use async_trait::async_trait;
use std::sync::Arc;
use triage_agent::prompt::{build_bug_type_prompt, build_refactor_prompt, build_suggest_fix_prompt};
use triage_agent::SharedModel;
use triage_analysis::{explain_code, flow_json};
use triage_core::fail_open::fail_open_text;
use triage_core::TriageError;

/// A named text-in, text-out capability
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Run the tool; errors come back as text
    async fn call(&self, input: &str) -> String;
}

/// Function signature extraction through the code-parser service
pub struct CodeParserTool {
    services: Arc<ServiceClient>,
}

impl CodeParserTool {
    pub fn new(services: Arc<ServiceClient>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Tool for CodeParserTool {
    fn name(&self) -> &str {
        "CodeParser"
    }

    fn description(&self) -> &str {
        "Extracts function name, arguments, and docstring from Python code."
    }

    async fn call(&self, input: &str) -> String {
        fail_open_text(self.name(), || self.services.parse_function(input)).await
    }
}

/// Schema validation through the JSON-validator service
///
/// Input is a JSON document, usually `{"schema": ..., "payload": ...}`.
pub struct JsonValidatorTool {
    services: Arc<ServiceClient>,
}

impl JsonValidatorTool {
    pub fn new(services: Arc<ServiceClient>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Tool for JsonValidatorTool {
    fn name(&self) -> &str {
        "JSONValidator"
    }

    fn description(&self) -> &str {
        "Validates a JSON payload against schema."
    }

    async fn call(&self, input: &str) -> String {
        fail_open_text(self.name(), || async {
            let request = serde_json::from_str::<serde_json::Value>(input.trim()).map_err(|e| {
                TriageError::Service(format!("input is not valid JSON: {}", e))
            })?;
            self.services.validate_json(&request).await
        })
        .await
    }
}

/// A tool answered by the model from a prompt template
pub struct PromptTool {
    name: &'static str,
    description: &'static str,
    build_prompt: fn(&str) -> String,
    model: SharedModel,
}

impl PromptTool {
    pub fn bug_type_classifier(model: SharedModel) -> Self {
        Self {
            name: "BugTypeClassifier",
            description: "Classifies code bugs by type and cause.",
            build_prompt: build_bug_type_prompt,
            model,
        }
    }

    pub fn refactor_code(model: SharedModel) -> Self {
        Self {
            name: "RefactorCode",
            description: "Refactors Python code for readability and best practices.",
            build_prompt: build_refactor_prompt,
            model,
        }
    }

    pub fn suggest_fix(model: SharedModel) -> Self {
        Self {
            name: "SuggestFix",
            description: "Suggests corrections to buggy Python code.",
            build_prompt: build_suggest_fix_prompt,
            model,
        }
    }
}

#[async_trait]
impl Tool for PromptTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    async fn call(&self, input: &str) -> String {
        let prompt = (self.build_prompt)(input);
        let text = fail_open_text(self.name, || self.model.complete(&prompt)).await;
        text.trim().to_string()
    }
}

/// Keyword heuristic explanation
pub struct CodeExplainerTool;

#[async_trait]
impl Tool for CodeExplainerTool {
    fn name(&self) -> &str {
        "CodeExplainer"
    }

    fn description(&self) -> &str {
        "Explains what a function or code snippet is doing."
    }

    async fn call(&self, input: &str) -> String {
        explain_code(input)
    }
}

/// Branches, loops and calls as JSON
pub struct FlowVisualizerTool;

#[async_trait]
impl Tool for FlowVisualizerTool {
    fn name(&self) -> &str {
        "FlowVisualizer"
    }

    fn description(&self) -> &str {
        "Returns JSON of branches, loops, and function calls from code."
    }

    async fn call(&self, input: &str) -> String {
        flow_json(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_agent::testing::ScriptedModel;

    #[tokio::test]
    async fn test_prompt_tool_wraps_input() {
        let model = Arc::new(ScriptedModel::new("mistral").with_replies(["  Bug Type: off-by-one\n"]));
        let tool = PromptTool::bug_type_classifier(model.clone());

        assert_eq!(tool.call("txt[:100]").await, "Bug Type: off-by-one");
        assert!(model.calls()[0].contains("txt[:100]"));
    }

    #[tokio::test]
    async fn test_prompt_tool_reports_backend_error_as_text() {
        let tool = PromptTool::suggest_fix(Arc::new(ScriptedModel::new("mistral")));
        let text = tool.call("def f(): pass").await;
        assert!(text.starts_with("SuggestFix error:"));
    }

    #[tokio::test]
    async fn test_static_tools() {
        assert!(CodeExplainerTool
            .call("def f(x): return x")
            .await
            .starts_with("Likely a function"));

        let flow: serde_json::Value =
            serde_json::from_str(&FlowVisualizerTool.call("if a:\n    go()").await).unwrap();
        assert_eq!(flow["branches"][0], "a");
        assert_eq!(flow["function_calls"][0], "go");
    }
}
