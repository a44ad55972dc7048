//! # triage-tools
//!
//! Collaborators around the workflow:
//! - Clients for the code-parser and JSON-validator HTTP services
//! - The [`Tool`] trait and the standard [`ToolRegistry`] used by the
//!   single-shot agent
//! - Schema file loading for JSON validation
//!
//! Every tool fails open: a failing service or model comes back as text.

mod registry;
mod schema;
mod services;
mod tool;

pub use registry::ToolRegistry;
pub use schema::{load_schema_from_file, validation_request};
pub use services::ServiceClient;
pub use tool::{
    CodeExplainerTool, CodeParserTool, FlowVisualizerTool, JsonValidatorTool, PromptTool, Tool,
};
