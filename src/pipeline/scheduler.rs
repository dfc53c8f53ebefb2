//! Reply-candidate selection over assembled threads.
//!
//! Per-thread ordering is deliberate: the cheap flag gate runs before the
//! aggregate date scan. No state survives between runs.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::pipeline::dates;
use crate::pipeline::types::{ReplyCandidate, Thread};

/// Select the threads due for an automated follow-up.
///
/// A thread qualifies when it carries an Active flag and its latest
/// activity (header timestamps plus dates buried in quoted reply chains)
/// is strictly older than `staleness_days`. The reply target is the
/// latest message by timestamp, regardless of which message carries the
/// flag.
pub fn select(
    threads: &[Thread],
    staleness_days: i64,
    now: DateTime<Utc>,
) -> Vec<ReplyCandidate> {
    let mut candidates = Vec::new();

    for thread in threads {
        // 1. Eligibility: at least one Active flag anywhere in the thread.
        if !thread.has_active_flag() {
            continue;
        }

        let subject = thread.subject().to_string();
        debug!(subject = %subject, "Analyzing flagged thread");

        // 2. True latest activity across every message.
        let mut all_dates: Vec<DateTime<Utc>> = Vec::new();
        for message in &thread.messages {
            if let Some(ts) = message.timestamp {
                all_dates.push(ts);
            }
            if let Some(buried) = dates::latest_of(&message.content) {
                all_dates.push(buried);
            }
        }

        let Some(latest_activity) = all_dates.into_iter().max() else {
            warn!(subject = %subject, "Could not determine any activity date; skipping thread");
            continue;
        };

        // 3. Staleness. Exactly at the threshold counts as not yet due.
        let days_ago = (now - latest_activity).num_days();
        if days_ago <= staleness_days {
            debug!(
                subject = %subject,
                days_ago,
                "Activity within threshold; no reply needed yet"
            );
            continue;
        }
        info!(
            subject = %subject,
            latest_activity = %latest_activity,
            days_ago,
            "No activity past threshold; selecting reply target"
        );

        // 4. Target: latest message by timestamp. Unresolved timestamps
        //    sort first, so they are never picked over a dated message.
        let mut sorted = thread.messages.clone();
        sorted.sort_by_key(|m| m.timestamp);
        let Some(target) = sorted.pop() else {
            continue;
        };

        // 5. Without a MessageID there is nothing to address the reply to.
        if target.message_id.is_none() {
            error!(subject = %subject, "No MessageID on target message; excluding thread");
            continue;
        }

        candidates.push(ReplyCandidate {
            thread: thread.clone(),
            target,
            subject,
        });
    }

    candidates
}
