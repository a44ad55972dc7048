//! Top-level entry point: one request in, one report out

use crate::activity_logger::ActivityLogger;
use crate::graph::WorkflowGraph;
use crate::nodes::Nodes;
use crate::single_shot::SingleShotAgent;
use crate::workflow::Workflow;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use triage_agent::{connect_ollama, tool_model};
use triage_core::config::Strategy;
use triage_core::{Result, TriageConfig};
use triage_tools::{ServiceClient, ToolRegistry};
use triage_validation::VerificationOracle;

/// Anything that can triage a reported issue
#[async_trait]
pub trait Triage: Send + Sync {
    /// Produce a report for `input`
    ///
    /// Never fails; errors are reported in the returned text.
    async fn debug_tool_issue(&self, input: &str) -> String;
}

/// Dispatches requests to the configured strategy
#[derive(Clone)]
pub struct Debugger {
    strategy: Strategy,
    workflow: Workflow,
    single_shot: SingleShotAgent,
}

impl Debugger {
    /// Connect every collaborator described by `config`
    ///
    /// Fails only when no candidate model backend answers.
    pub async fn connect(config: &TriageConfig, root: &Path) -> Result<Self> {
        let pair = connect_ollama(&config.model).await?;
        tracing::info!(model = %pair.name(), strategy = %config.strategy, "Debugger ready");

        let services = Arc::new(ServiceClient::new(&config.services)?);
        let tools = ToolRegistry::standard(services, tool_model(&config.model)?);

        let nodes = Nodes::new(
            pair.decoder(config.workflow.excerpt_chars),
            pair.raw.clone(),
            VerificationOracle::from_config(&config.verification),
        )
        .with_max_fix_attempts(config.workflow.max_fix_attempts);

        let mut workflow = Workflow::new(WorkflowGraph::standard()?, nodes)
            .with_step_guard(config.workflow.max_steps);
        if let Some(path) = config.activity_log_path(root) {
            workflow = workflow.with_activity_log(ActivityLogger::new(path));
        }

        Ok(Self::from_parts(
            config.strategy,
            workflow,
            SingleShotAgent::new(pair.raw, tools),
        ))
    }

    pub fn from_parts(strategy: Strategy, workflow: Workflow, single_shot: SingleShotAgent) -> Self {
        Self {
            strategy,
            workflow,
            single_shot,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn single_shot(&self) -> &SingleShotAgent {
        &self.single_shot
    }
}

#[async_trait]
impl Triage for Debugger {
    async fn debug_tool_issue(&self, input: &str) -> String {
        let result = match self.strategy {
            Strategy::Graph => self.workflow.run(input).await.map(|outcome| outcome.report),
            Strategy::SingleShot => self.single_shot.run(input).await,
        };

        result.unwrap_or_else(|e| {
            tracing::error!(error = %e, strategy = %self.strategy, "Triage run failed");
            format!("Error: {}", e)
        })
    }
}
