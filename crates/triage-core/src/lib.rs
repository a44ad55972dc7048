//! # triage-core
//!
//! Core types for the triage workflow.
//!
//! A triage run takes a reported defect (free text or a source snippet) and
//! threads a single [`ConversationState`] through a small graph of processing
//! steps. This crate holds everything those steps share:
//!
//! - Turns and roles (the append-only conversation)
//! - The [`Verdict`] record produced by the model
//! - Verification outcomes and auxiliary artifacts
//! - Configuration loading and the unified error type

pub mod config;
mod error;
pub mod fail_open;
mod state;
mod types;

pub use config::TriageConfig;
pub use error::{Result, TriageError};
pub use state::ConversationState;
pub use types::*;
