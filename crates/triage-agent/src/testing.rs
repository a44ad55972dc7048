//! In-memory model backend for tests
//!
//! Enabled for this crate's own tests and for downstream crates through the
//! `testing` feature.

use crate::client::LanguageModel;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use triage_core::{Result, TriageError};

type Responder = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// A backend that answers from a script and records every prompt it sees
///
/// Queued replies are consumed first; once the queue is empty the responder
/// (if any) is consulted. With neither, the call fails like an unreachable
/// backend.
pub struct ScriptedModel {
    name: String,
    replies: Mutex<VecDeque<String>>,
    responder: Option<Responder>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(VecDeque::new()),
            responder: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue replies returned in order, one per call
    pub fn with_replies<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut queue) = self.replies.lock() {
            queue.extend(replies.into_iter().map(Into::into));
        }
        self
    }

    /// Answer prompts the queue does not cover; `None` fails the call
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Every prompt received so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn reply(&self, prompt: &str) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(prompt.to_string());
        }

        let queued = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        queued
            .or_else(|| self.responder.as_ref().and_then(|r| r(prompt)))
            .ok_or_else(|| TriageError::Api(format!("{} has no scripted reply", self.name)))
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.reply(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_responder() {
        let model = ScriptedModel::new("scripted")
            .with_replies(["first"])
            .with_responder(|prompt| prompt.contains("severity").then(|| "low".to_string()));

        assert_eq!(model.complete("anything").await.unwrap(), "first");
        assert_eq!(model.complete("rate severity").await.unwrap(), "low");
        assert!(model.complete("other").await.is_err());
        assert_eq!(model.calls().len(), 3);
    }
}
