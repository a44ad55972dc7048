//! Workflow graph: named nodes and the edges between them
//!
//! Routing is a pure function of the current node and the state's `retry`
//! flag. No I/O, no async; everything here is deterministic and testable.

use std::collections::HashMap;
use triage_core::{Result, TriageError};

/// Processing steps of a triage run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    /// Decode a verdict for the last turn
    Agent,
    /// Resubmit a failed fix for another pass
    BugFixer,
    /// Run the regression check on the latest fix
    VerifyPatch,
    /// Describe execution paths of the original input
    SimulatePaths,
    /// Label the severity of the original input
    RankSeverity,
    /// Generate a unit test for the original input
    GenerateTests,
    /// Collapse every assistant turn into the report
    Summarize,
}

impl NodeId {
    pub const ALL: [NodeId; 7] = [
        NodeId::Agent,
        NodeId::BugFixer,
        NodeId::VerifyPatch,
        NodeId::SimulatePaths,
        NodeId::RankSeverity,
        NodeId::GenerateTests,
        NodeId::Summarize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::BugFixer => "bug_fixer",
            Self::VerifyPatch => "verify_patch",
            Self::SimulatePaths => "simulate_paths",
            Self::RankSeverity => "rank_severity",
            Self::GenerateTests => "generate_tests",
            Self::Summarize => "summarize",
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for NodeId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|node| node.name() == s.trim())
            .ok_or_else(|| format!("Unknown node: {}", s))
    }
}

/// Outgoing edge of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Always continue to the target
    Direct(NodeId),
    /// Branch on the state's `retry` flag
    OnRetry { retry: NodeId, otherwise: NodeId },
}

impl Edge {
    fn targets(&self) -> Vec<NodeId> {
        match *self {
            Self::Direct(to) => vec![to],
            Self::OnRetry { retry, otherwise } => vec![retry, otherwise],
        }
    }
}

/// Pure routing decision
///
/// `None` means the run is over.
pub fn route(edge: Option<&Edge>, retry: bool) -> Option<NodeId> {
    match edge? {
        Edge::Direct(to) => Some(*to),
        Edge::OnRetry { retry: on_retry, .. } if retry => Some(*on_retry),
        Edge::OnRetry { otherwise, .. } => Some(*otherwise),
    }
}

/// Assembles a [`WorkflowGraph`]; problems are reported by [`GraphBuilder::compile`]
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<NodeId>,
    edges: HashMap<NodeId, Edge>,
    entry: Option<NodeId>,
    finish: Option<NodeId>,
    problems: Vec<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(mut self, node: NodeId) -> Self {
        if self.nodes.contains(&node) {
            self.problems.push(format!("node {} added twice", node));
        } else {
            self.nodes.push(node);
        }
        self
    }

    pub fn add_edge(self, from: NodeId, to: NodeId) -> Self {
        self.insert_edge(from, Edge::Direct(to))
    }

    /// Route `from` to `retry` when the flag is set, else to `otherwise`
    pub fn add_conditional_edges(self, from: NodeId, retry: NodeId, otherwise: NodeId) -> Self {
        self.insert_edge(from, Edge::OnRetry { retry, otherwise })
    }

    pub fn entry(mut self, node: NodeId) -> Self {
        self.entry = Some(node);
        self
    }

    pub fn finish(mut self, node: NodeId) -> Self {
        self.finish = Some(node);
        self
    }

    fn insert_edge(mut self, from: NodeId, edge: Edge) -> Self {
        if self.edges.insert(from, edge).is_some() {
            self.problems
                .push(format!("node {} has more than one outgoing edge", from));
        }
        self
    }

    /// Validate and freeze the graph
    pub fn compile(self) -> Result<WorkflowGraph> {
        let mut problems = self.problems;

        let known = |node: &NodeId| self.nodes.contains(node);

        let entry = match self.entry {
            Some(node) if known(&node) => Some(node),
            Some(node) => {
                problems.push(format!("entry {} is not a node", node));
                None
            }
            None => {
                problems.push("no entry node".to_string());
                None
            }
        };

        let finish = match self.finish {
            Some(node) if !known(&node) => {
                problems.push(format!("finish {} is not a node", node));
                None
            }
            Some(node) if self.edges.contains_key(&node) => {
                problems.push(format!("finish {} has an outgoing edge", node));
                None
            }
            Some(node) => Some(node),
            None => {
                problems.push("no finish node".to_string());
                None
            }
        };

        for (from, edge) in &self.edges {
            if !known(from) {
                problems.push(format!("edge from unknown node {}", from));
            }
            for to in edge.targets() {
                if !known(&to) {
                    problems.push(format!("edge {} -> {} targets an unknown node", from, to));
                }
            }
        }

        for node in &self.nodes {
            if Some(*node) != finish && !self.edges.contains_key(node) {
                problems.push(format!("node {} has no outgoing edge", node));
            }
        }

        match (entry, finish) {
            (Some(entry), Some(finish)) if problems.is_empty() => Ok(WorkflowGraph {
                entry,
                finish,
                edges: self.edges,
            }),
            _ => Err(TriageError::Graph(problems.join("; "))),
        }
    }
}

/// A validated node graph
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    entry: NodeId,
    finish: NodeId,
    edges: HashMap<NodeId, Edge>,
}

impl WorkflowGraph {
    /// The triage graph:
    ///
    /// ```text
    /// agent -> verify_patch -(retry)-> bug_fixer -> agent
    ///               |
    ///               +-(otherwise)-> simulate_paths -> rank_severity
    ///                               -> generate_tests -> summarize
    /// ```
    pub fn standard() -> Result<Self> {
        NodeId::ALL
            .into_iter()
            .fold(GraphBuilder::new(), GraphBuilder::add_node)
            .entry(NodeId::Agent)
            .add_edge(NodeId::Agent, NodeId::VerifyPatch)
            .add_conditional_edges(NodeId::VerifyPatch, NodeId::BugFixer, NodeId::SimulatePaths)
            .add_edge(NodeId::BugFixer, NodeId::Agent)
            .add_edge(NodeId::SimulatePaths, NodeId::RankSeverity)
            .add_edge(NodeId::RankSeverity, NodeId::GenerateTests)
            .add_edge(NodeId::GenerateTests, NodeId::Summarize)
            .finish(NodeId::Summarize)
            .compile()
    }

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn finish(&self) -> NodeId {
        self.finish
    }

    /// Node to run after `from`, given the current `retry` flag
    pub fn next(&self, from: NodeId, retry: bool) -> Option<NodeId> {
        route(self.edges.get(&from), retry)
    }
}
