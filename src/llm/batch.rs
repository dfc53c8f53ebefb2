//! Batch reply contract.
//!
//! Jobs go out as one combined prompt; the model must answer with a raw
//! JSON array of `{id, reply_text}` objects. Attempts walk the candidate
//! model chain in order and the first non-empty mapping wins. Exhausting
//! the chain yields an empty map — "no replies available", never an error
//! for the caller to escalate.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::llm::CandidateModel;

/// One unit of work for the generation contract, keyed by the target
/// message's addressable id.
#[derive(Debug, Clone, Serialize)]
pub struct BatchJob {
    pub id: String,
    pub subject: String,
    pub content: String,
}

/// Mapping from message id to generated reply text.
pub type BatchResult = HashMap<String, String>;

/// Task instructions appended after the system prompt. The JSON-list
/// output format keeps replies addressable by message id.
const BATCH_TASK_INSTRUCTIONS: &str = "\
TASK: You are processing a batch of emails. For each email provided in the JSON list below, \
generate a reply based on the persona.
OUTPUT FORMAT: You MUST return a raw JSON list of objects. Each object must have exactly two fields:
  - \"id\": The exact id from the input.
  - \"reply_text\": Your generated response.

Do not output markdown formatting (like ```json), just the raw JSON.

INPUT DATA:
";

/// Generate replies for a batch of jobs, falling back across the model
/// chain until one attempt yields a non-empty mapping.
pub async fn generate_batch(
    models: &[CandidateModel],
    jobs: &[BatchJob],
    system_prompt: &str,
    preferred_model: Option<&str>,
) -> BatchResult {
    if jobs.is_empty() || models.is_empty() {
        return BatchResult::new();
    }

    let payload = match serde_json::to_string_pretty(jobs) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Failed to serialize batch jobs");
            return BatchResult::new();
        }
    };
    let prompt = format!("{system_prompt}\n\n{BATCH_TASK_INSTRUCTIONS}{payload}");

    for model in order_models(models, preferred_model) {
        info!(model = %model.id, jobs = jobs.len(), "Attempting batch generation");

        let raw = match model.provider.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(model = %model.id, error = %e, "Batch attempt failed; trying next model");
                continue;
            }
        };

        let results = parse_batch_response(&raw);
        if !results.is_empty() {
            info!(model = %model.id, replies = results.len(), "Batch generation succeeded");
            return results;
        }
        warn!(model = %model.id, "Batch response yielded no replies; trying next model");
    }

    warn!("All models failed to generate batch replies");
    BatchResult::new()
}

/// Generate a single reply for one email body, walking the same model
/// chain. Returns the first non-empty response, or `None` when every
/// model fails.
pub async fn generate_reply(
    models: &[CandidateModel],
    email_body: &str,
    system_prompt: &str,
) -> Option<String> {
    let prompt = format!("{system_prompt}\n\nEmail Thread:\n{email_body}\n\nResponse:");

    for model in models {
        info!(model = %model.id, "Attempting reply generation");
        match model.provider.complete(&prompt).await {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    return Some(text.to_string());
                }
                warn!(model = %model.id, "Empty reply; trying next model");
            }
            Err(e) => {
                warn!(model = %model.id, error = %e, "Reply attempt failed; trying next model");
            }
        }
    }

    warn!("All models failed to generate a reply");
    None
}

/// Reorder the chain so a preferred model, when present, is tried first.
/// Relative order of the rest is preserved.
fn order_models<'a>(
    models: &'a [CandidateModel],
    preferred: Option<&str>,
) -> Vec<&'a CandidateModel> {
    let mut ordered: Vec<&CandidateModel> = models.iter().collect();
    if let Some(preferred) = preferred {
        if let Some(pos) = ordered.iter().position(|m| m.id == preferred) {
            let chosen = ordered.remove(pos);
            ordered.insert(0, chosen);
        }
    }
    ordered
}

/// Strip a markdown code-fence wrapper, if the model added one despite
/// instructions.
fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Decode a provider response into an id → reply_text mapping.
///
/// Accepts a top-level JSON array or, defensively, an object whose first
/// value is an array (JSON-object response modes sometimes wrap the
/// list). Entries that are not objects carrying string `id` and
/// `reply_text` are dropped. Any other shape decodes to an empty map.
fn parse_batch_response(raw: &str) -> BatchResult {
    let text = strip_code_fences(raw);
    let parsed: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Batch response is not valid JSON");
            return BatchResult::new();
        }
    };

    let items: Vec<serde_json::Value> = match parsed {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => match map.into_iter().next() {
            Some((_, serde_json::Value::Array(items))) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut results = BatchResult::new();
    for item in items {
        let (Some(id), Some(reply)) = (
            item.get("id").and_then(|v| v.as_str()),
            item.get("reply_text").and_then(|v| v.as_str()),
        ) else {
            continue;
        };
        results.insert(id.to_string(), reply.to_string());
    }
    results
}
