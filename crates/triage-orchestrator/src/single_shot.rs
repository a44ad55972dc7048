//! Single-shot agent: one bounded tool-using pass, no verification loop

use crate::prompt::{
    build_agent_prompt, build_forced_answer_prompt, parse_agent_step, strip_observation, AgentStep,
};
use tracing::{debug, info, warn};
use triage_agent::SharedModel;
use triage_core::Result;
use triage_tools::ToolRegistry;

const DEFAULT_MAX_STEPS: usize = 6;

/// Answers a request by letting the model call tools until it has an answer
#[derive(Clone)]
pub struct SingleShotAgent {
    model: SharedModel,
    tools: ToolRegistry,
    max_steps: usize,
}

impl SingleShotAgent {
    pub fn new(model: SharedModel, tools: ToolRegistry) -> Self {
        Self {
            model,
            tools,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Tool calls allowed before an answer is forced
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run the agent over `input`
    ///
    /// Errors only when the model itself cannot be reached; tool failures are
    /// observations like any other.
    pub async fn run(&self, input: &str) -> Result<String> {
        let descriptions = self.tools.describe();
        let names = self.tools.names();
        let mut scratchpad = String::new();

        for step in 1..=self.max_steps {
            let prompt = build_agent_prompt(input, &descriptions, &names, &scratchpad);
            let reply = self.model.complete(&prompt).await?;

            match parse_agent_step(&reply) {
                AgentStep::Final(answer) => {
                    info!(steps = step, "Single-shot agent answered");
                    return Ok(answer);
                }
                AgentStep::Action { tool, input: tool_input } => {
                    let observation = match self.tools.get(&tool) {
                        Some(found) => found.call(&tool_input).await,
                        None => {
                            warn!(tool = %tool, "Model asked for an unknown tool");
                            format!(
                                "{} is not a valid tool, try one of [{}].",
                                tool,
                                names.join(", ")
                            )
                        }
                    };
                    debug!(step, tool = %tool, chars = observation.len(), "Tool observed");

                    scratchpad.push_str(strip_observation(&reply).trim_end());
                    scratchpad.push_str(&format!("\nObservation: {}\n", observation.trim()));
                }
            }
        }

        warn!(max_steps = self.max_steps, "Step limit reached, forcing an answer");
        let prompt = build_forced_answer_prompt(input, &descriptions, &names, &scratchpad);
        let reply = self.model.complete(&prompt).await?;

        Ok(match parse_agent_step(&reply) {
            AgentStep::Final(answer) => answer,
            AgentStep::Action { .. } => reply.trim().to_string(),
        })
    }
}
