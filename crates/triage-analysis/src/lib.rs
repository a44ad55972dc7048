//! # triage-analysis
//!
//! Static analysis of Python snippets over a tree-sitter syntax tree.
//!
//! - [`simulate_paths`]: branch and return description of a snippet
//! - [`visualize_flow`]: branches, loops and function calls
//! - [`explain_code`]: keyword heuristic
//! - Generated-test decoding and fallback test sketches
//!
//! Nothing here talks to a model or executes code.

mod flow;
pub mod syntax;
mod testgen;

pub use flow::{explain_code, flow_json, simulate_paths, visualize_flow, FlowSummary, PATHS_HEADER};
pub use syntax::top_level_functions;
pub use testgen::{parse_generated_test, sketch_test, MISSING_KEY_MARKER, UNPARSED_MARKER};
