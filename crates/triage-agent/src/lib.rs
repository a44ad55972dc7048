//! # triage-agent
//!
//! Model backend client and structured verdict decoding.
//!
//! - A [`LanguageModel`] trait with an Ollama implementation
//! - Circuit breaker and retry for backend protection
//! - Ordered fallback between candidate models, probed at startup
//! - Three-tier [`VerdictDecoder`]: strict schema (with one self-repair),
//!   embedded-JSON scan of a plain completion, raw-text excerpt
//!
//! ## Key Pattern
//!
//! Every call is a fresh, stateless prompt. Conversation history lives in the
//! workflow's state, never in the client.

mod circuit_breaker;
mod client;
mod decoder;
pub mod extract;
mod fallback;
pub mod prompt;
mod structured;
mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use client::{LanguageModel, OllamaClient, SharedModel};
pub use decoder::{decode_raw_text, Decoded, VerdictDecoder, DEFAULT_EXCERPT_CHARS};
pub use fallback::{connect_ollama, connect_with_fallback, tool_model, ModelPair};
pub use structured::{bool_like, decode_lenient, decode_strict, StructuredClient};
pub use types::*;
