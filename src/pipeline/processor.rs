//! Per-run orchestration: raw export in, reply mapping out.
//!
//! parse → group → select → strip → batch generate. Stateless by design:
//! everything is rebuilt from the export string and the caller's clock on
//! each invocation, and nothing survives the run.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::llm::{BatchJob, BatchResult, CandidateModel, generate_batch};
use crate::pipeline::dates;
use crate::pipeline::parser;
use crate::pipeline::scheduler;
use crate::pipeline::signature::SignatureStripper;
use crate::pipeline::threads;
use crate::pipeline::types::ReplyCandidate;

/// Run the full pipeline over one mailbox export.
///
/// Total failure at any stage degrades to an empty mapping plus log
/// lines; nothing here returns an error.
pub async fn process_export(
    raw_export: &str,
    config: &RunConfig,
    models: &[CandidateModel],
    now: DateTime<Utc>,
) -> BatchResult {
    let messages = parser::parse(raw_export);
    if messages.is_empty() {
        info!("Export contained no messages");
        return BatchResult::new();
    }
    info!(messages = messages.len(), "Parsed export");

    let threads = threads::group(messages);
    info!(threads = threads.len(), "Identified unique threads");

    let candidates = scheduler::select(&threads, config.staleness_days, now);
    if candidates.is_empty() {
        info!("No active threads requiring replies found");
        return BatchResult::new();
    }

    let jobs = build_jobs(&candidates);
    info!(jobs = jobs.len(), "Submitting batch generation");

    let system_prompt = format!(
        "{}\n\n{}",
        dates::current_date_context(now),
        config.system_prompt
    );
    let replies = generate_batch(
        models,
        &jobs,
        &system_prompt,
        config.preferred_model.as_deref(),
    )
    .await;

    for job in &jobs {
        if !replies.contains_key(&job.id) {
            warn!(subject = %job.subject, id = %job.id, "No reply generated");
        }
    }
    replies
}

/// Build batch jobs from reply candidates, one per candidate,
/// deduplicated by message id. Target bodies are cleaned with the
/// signature stripper using the candidate's own thread as context.
pub fn build_jobs(candidates: &[ReplyCandidate]) -> Vec<BatchJob> {
    let stripper = SignatureStripper::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut jobs = Vec::new();

    for candidate in candidates {
        // The scheduler guarantees an id; guard anyway.
        let Some(id) = candidate.target.message_id.clone() else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        let content = stripper.strip(&candidate.target.content, Some(&candidate.thread.messages));
        jobs.push(BatchJob {
            id,
            subject: candidate.subject.clone(),
            content,
        });
    }
    jobs
}
