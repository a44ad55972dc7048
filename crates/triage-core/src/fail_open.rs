//! Fail-open utilities for graceful degradation
//!
//! Helpers and collaborators around the workflow (activity logging, the
//! auxiliary HTTP services) must never abort a run. These wrappers log the
//! failure and hand back something the caller can keep going with.
//!
//! DO NOT use fail-open for:
//! - Model backend selection (the one fatal startup error)
//! - Workflow graph construction

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Execute an operation that should fail open
///
/// Logs the error via `tracing::warn!` on failure and returns `None`.
///
/// ```no_run
/// use triage_core::fail_open::fail_open;
/// use triage_core::Result;
///
/// async fn append_log() -> Result<()> {
///     Ok(())
/// }
///
/// async fn example() {
///     let result = fail_open("activity_logger", || append_log()).await;
///     // result is None if append_log() failed
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}

/// Execute an operation whose failure becomes a textual message
///
/// Used where a collaborator's result is text that flows back into a
/// conversation: the error message takes the place of the result.
pub async fn fail_open_text<F, Fut>(operation_name: &str, f: F) -> String
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    match f().await {
        Ok(text) => text,
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            format!("{} error: {}", operation_name, e)
        }
    }
}
