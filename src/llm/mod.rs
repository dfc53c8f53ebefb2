//! LLM provider integration.
//!
//! Supports:
//! - **Gemini**: Direct API access via rig-core
//! - **OpenAI**: Direct API access via rig-core
//!
//! Uses the rig-core crate for HTTP transport and the `RigAdapter` to
//! bridge rig's `CompletionModel` trait to our `LlmProvider` trait. The
//! pipeline only ever sees the trait and a priority-ordered list of
//! candidate models; transport stays behind this seam.

pub mod batch;
mod rig_adapter;

pub use batch::{BatchJob, BatchResult, generate_batch, generate_reply};
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use async_trait::async_trait;
use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::LlmError;

/// A text-completion provider. One combined prompt in, raw text out.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model id this provider generates with.
    fn model_name(&self) -> &str;

    /// Run one completion request. Network I/O; the only call in the
    /// pipeline that blocks for a non-trivial duration.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Gemini,
    OpenAi,
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// One entry in the priority-ordered model fallback chain.
#[derive(Clone)]
pub struct CandidateModel {
    /// Model id, as understood by its provider.
    pub id: String,
    /// Provider that generates with this model.
    pub provider: Arc<dyn LlmProvider>,
}

/// Default model priority per backend, cheapest first.
pub const GEMINI_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite"];
pub const OPENAI_MODELS: &[&str] = &["gpt-4o-mini", "gpt-3.5-turbo"];

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.backend {
        LlmBackend::Gemini => create_gemini_provider(config),
        LlmBackend::OpenAi => create_openai_provider(config),
    }
}

fn create_gemini_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::gemini;

    let client: rig::client::Client<gemini::client::GeminiExt> =
        gemini::Client::new(config.api_key.expose_secret()).map_err(|e| {
            LlmError::RequestFailed {
                provider: "gemini".to_string(),
                reason: format!("Failed to create Gemini client: {}", e),
            }
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using Gemini (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(model, &config.model)))
}

fn create_openai_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(config.api_key.expose_secret()).map_err(|e| {
            LlmError::RequestFailed {
                provider: "openai".to_string(),
                reason: format!("Failed to create OpenAI client: {}", e),
            }
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using OpenAI (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(model, &config.model)))
}

/// Build the candidate model chain for the backends whose API keys are
/// present, in backend priority order.
pub fn candidate_models(
    gemini_key: Option<secrecy::SecretString>,
    openai_key: Option<secrecy::SecretString>,
) -> Result<Vec<CandidateModel>, LlmError> {
    let mut models = Vec::new();

    if let Some(key) = gemini_key {
        for id in GEMINI_MODELS {
            let provider = create_provider(&LlmConfig {
                backend: LlmBackend::Gemini,
                api_key: key.clone(),
                model: (*id).to_string(),
            })?;
            models.push(CandidateModel {
                id: (*id).to_string(),
                provider,
            });
        }
    }

    if let Some(key) = openai_key {
        for id in OPENAI_MODELS {
            let provider = create_provider(&LlmConfig {
                backend: LlmBackend::OpenAi,
                api_key: key.clone(),
                model: (*id).to_string(),
            })?;
            models.push(CandidateModel {
                id: (*id).to_string(),
                provider,
            });
        }
    }

    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_accepts_any_key_at_construction() {
        // rig-core clients accept any string as API key at construction
        // time; auth failures surface on the first request.
        let config = LlmConfig {
            backend: LlmBackend::Gemini,
            api_key: secrecy::SecretString::from("test-key"),
            model: "gemini-2.5-flash".to_string(),
        };
        let provider = create_provider(&config);
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().model_name(), "gemini-2.5-flash");
    }

    #[test]
    fn create_openai_provider_reports_model_name() {
        let config = LlmConfig {
            backend: LlmBackend::OpenAi,
            api_key: secrecy::SecretString::from("sk-test"),
            model: "gpt-4o-mini".to_string(),
        };
        let provider = create_provider(&config);
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().model_name(), "gpt-4o-mini");
    }

    #[test]
    fn candidate_models_follow_backend_priority() {
        let models = candidate_models(
            Some(secrecy::SecretString::from("g-key")),
            Some(secrecy::SecretString::from("o-key")),
        )
        .unwrap();
        let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "gemini-2.5-flash",
                "gemini-2.5-flash-lite",
                "gpt-4o-mini",
                "gpt-3.5-turbo"
            ]
        );
    }

    #[test]
    fn candidate_models_empty_without_keys() {
        assert!(candidate_models(None, None).unwrap().is_empty());
    }
}
