//! Named tool lookup

use crate::services::ServiceClient;
use crate::tool::{
    CodeExplainerTool, CodeParserTool, FlowVisualizerTool, JsonValidatorTool, PromptTool, Tool,
};
use std::sync::Arc;
use triage_agent::SharedModel;

/// Ordered set of tools, looked up by name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The seven standard tools
    pub fn standard(services: Arc<ServiceClient>, model: SharedModel) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CodeParserTool::new(services.clone())));
        registry.register(Arc::new(JsonValidatorTool::new(services)));
        registry.register(Arc::new(PromptTool::bug_type_classifier(model.clone())));
        registry.register(Arc::new(CodeExplainerTool));
        registry.register(Arc::new(PromptTool::refactor_code(model.clone())));
        registry.register(Arc::new(PromptTool::suggest_fix(model)));
        registry.register(Arc::new(FlowVisualizerTool));
        registry
    }

    /// Add a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| !t.name().eq_ignore_ascii_case(tool.name()));
        self.tools.push(tool);
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let name = name.trim();
        self.tools
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// One `Name: description` line per tool
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_agent::testing::ScriptedModel;
    use triage_core::config::ServicesConfig;

    fn standard() -> ToolRegistry {
        let services = Arc::new(ServiceClient::new(&ServicesConfig::default()).unwrap());
        ToolRegistry::standard(services, Arc::new(ScriptedModel::new("mistral")))
    }

    #[test]
    fn test_standard_registry_order() {
        assert_eq!(
            standard().names(),
            vec![
                "CodeParser",
                "JSONValidator",
                "BugTypeClassifier",
                "CodeExplainer",
                "RefactorCode",
                "SuggestFix",
                "FlowVisualizer",
            ]
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = standard();
        assert_eq!(registry.get(" flowvisualizer ").unwrap().name(), "FlowVisualizer");
        assert!(registry.get("Unknown").is_none());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = standard();
        registry.register(Arc::new(CodeExplainerTool));
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.names().last(), Some(&"CodeExplainer"));
    }

    #[test]
    fn test_describe() {
        let description = standard().describe();
        assert!(description.contains("CodeParser: Extracts function name"));
        assert_eq!(description.lines().count(), 7);
    }
}
