//! # triage-orchestrator
//!
//! Workflow engine for automated defect triage.
//!
//! This crate provides:
//! - The node graph and its pure routing rule
//! - Node bodies over the shared conversation state
//! - The timed run loop with a retry cap and a step guard
//! - The single-shot tool-using agent
//! - The [`Debugger`] facade choosing between the two strategies

mod activity_logger;
mod debugger;
mod graph;
mod nodes;
mod prompt;
mod single_shot;
mod workflow;

pub use activity_logger::ActivityLogger;
pub use debugger::{Debugger, Triage};
pub use graph::{route, Edge, GraphBuilder, NodeId, WorkflowGraph};
pub use nodes::{Nodes, REPORT_SEPARATOR};
pub use prompt::{build_agent_prompt, parse_agent_step, AgentStep, FINAL_ANSWER};
pub use single_shot::SingleShotAgent;
pub use workflow::{NodeTiming, RunOutcome, Workflow};
