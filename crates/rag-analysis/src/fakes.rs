//! Scripted language model for tests.
//!
//! Replies are chosen by the first rule whose marker occurs in the prompt,
//! falling back to a FIFO queue and then to a default reply. Every prompt is
//! recorded, including the ones that fail.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::LanguageModel;

#[derive(Debug, Default)]
pub struct ScriptedModel {
    rules: Vec<(String, String)>,
    failing_markers: Vec<String>,
    queue: Mutex<VecDeque<String>>,
    default_reply: String,
    prompts: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `reply` whenever the prompt contains `marker`.
    pub fn on(mut self, marker: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((marker.into(), reply.into()));
        self
    }

    /// Fail any prompt that contains `marker`.
    pub fn fail_on(mut self, marker: impl Into<String>) -> Self {
        self.failing_markers.push(marker.into());
        self
    }

    pub fn with_default(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    /// Queue a reply for the next prompt no rule matches.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.queue.lock().unwrap().push_back(reply.into());
    }

    /// Make every subsequent call fail with an HTTP error.
    pub fn fail_calls(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.failing.load(Ordering::SeqCst)
            || self.failing_markers.iter().any(|m| prompt.contains(m.as_str()))
        {
            return Err(LlmError::Http("scripted model failure".to_string()));
        }
        if let Some((_, reply)) = self.rules.iter().find(|(m, _)| prompt.contains(m.as_str())) {
            return Ok(reply.clone());
        }
        if let Some(reply) = self.queue.lock().unwrap().pop_front() {
            return Ok(reply);
        }
        Ok(self.default_reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rules_win_over_queue() {
        let model = ScriptedModel::new().on("impact", "I").with_default("D");
        model.push_reply("Q");
        assert_eq!(model.complete("assess impact").await.unwrap(), "I");
        assert_eq!(model.complete("other").await.unwrap(), "Q");
        assert_eq!(model.complete("other").await.unwrap(), "D");
        assert_eq!(model.call_count(), 3);
    }

    #[tokio::test]
    async fn failure_toggle() {
        let model = ScriptedModel::new();
        model.fail_calls(true);
        assert!(matches!(model.complete("x").await, Err(LlmError::Http(_))));
        assert_eq!(model.prompts(), vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn marker_failure_only_hits_matching_prompts() {
        let model = ScriptedModel::new()
            .on("impact", "I")
            .fail_on("impact")
            .with_default("D");
        assert_eq!(model.complete("validate").await.unwrap(), "D");
        assert!(matches!(
            model.complete("assess impact").await,
            Err(LlmError::Http(_))
        ));
        assert_eq!(model.call_count(), 2);
    }
}
