//! Bridge from rig-core completion models to the `LlmProvider` trait.

use async_trait::async_trait;
use rig::completion::CompletionModel;
use rig::message::{AssistantContent, Message};

use crate::error::LlmError;
use crate::llm::LlmProvider;

/// Adapts any rig `CompletionModel` to `LlmProvider`.
pub struct RigAdapter<M: CompletionModel> {
    model: M,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M: CompletionModel + Send + Sync> LlmProvider for RigAdapter<M> {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .model
            .completion_request(Message::user(prompt))
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: self.model_name.clone(),
                reason: e.to_string(),
            })?;

        match response.choice.first() {
            AssistantContent::Text(text) => Ok(text.text),
            other => Err(LlmError::InvalidResponse {
                provider: self.model_name.clone(),
                reason: format!("expected text completion, got {:?}", other),
            }),
        }
    }
}
