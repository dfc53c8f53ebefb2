//! Raw mailbox-export parsing.
//!
//! The export is one big string of records separated by a literal
//! delimiter. Each record carries `Key: value` header lines plus a body
//! region between two marker lines. Header keys are a fixed,
//! case-sensitive set; anything else is ignored.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::pipeline::dates;
use crate::pipeline::types::Message;

/// Record separator between messages in the export.
pub const RECORD_DELIMITER: &str = "///END_OF_MESSAGE///";
/// Marker line opening a body region.
pub const BODY_START: &str = "---BODY_START---";
/// Marker line closing a body region.
pub const BODY_END: &str = "---BODY_END---";

/// Sentinel id meaning the exporter had no conversation id.
const NO_ID: &str = "NO_ID";
/// Placeholder subject for records that carry none.
const NO_SUBJECT: &str = "No Subject";

static REPLY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^((re|fwd|fw):\s*)+").unwrap());

/// Strip leading reply/forward prefixes (`Re:`, `Fwd:`, `FW:`, stacked in
/// any combination) from a subject to form a grouping key.
pub fn normalize_subject(subject: &str) -> String {
    REPLY_PREFIX.replace(subject, "").trim().to_string()
}

/// Parse a raw export into messages.
///
/// Empty blocks are discarded. A malformed block is logged and skipped;
/// it never aborts parsing of the remaining export.
pub fn parse(raw_export: &str) -> Vec<Message> {
    let mut messages = Vec::new();
    for block in raw_export.split(RECORD_DELIMITER) {
        if block.trim().is_empty() {
            continue;
        }
        match parse_block(block) {
            Ok(message) => messages.push(message),
            Err(e) => warn!(error = %e, "Skipping malformed message block"),
        }
    }
    debug!(count = messages.len(), "Parsed export");
    messages
}

fn parse_block(block: &str) -> Result<Message, PipelineError> {
    let mut id: Option<String> = None;
    let mut from: Option<String> = None;
    let mut date: Option<String> = None;
    let mut subject: Option<String> = None;
    let mut flag_status: Option<String> = None;
    let mut message_id: Option<String> = None;
    let mut content_lines: Vec<&str> = Vec::new();
    let mut in_body = false;

    for line in block.lines() {
        let trimmed = line.trim();
        if trimmed == BODY_START {
            in_body = true;
            continue;
        }
        if trimmed == BODY_END {
            in_body = false;
            continue;
        }

        if in_body {
            // Body lines are kept verbatim, embedded blank lines included.
            content_lines.push(line);
        } else if let Some(v) = line.strip_prefix("ID: ") {
            id = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("From: ") {
            from = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("Date: ") {
            date = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("Subject: ") {
            subject = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("FlagStatus: ") {
            flag_status = Some(v.trim().to_string());
        } else if let Some(v) = line.strip_prefix("MessageID: ") {
            message_id = Some(v.trim().to_string());
        }
        // Unrecognized header lines are ignored, not errors.
    }

    if in_body {
        return Err(PipelineError::MalformedBlock(
            "body region opened but never closed".to_string(),
        ));
    }

    let timestamp = date.as_deref().and_then(dates::parse_one);
    let subject = subject.unwrap_or_else(|| NO_SUBJECT.to_string());

    // Fallback grouping key: every message gets one even when the
    // exporter had no conversation id.
    let id = match id {
        Some(v) if !v.is_empty() && v != NO_ID => v,
        _ => normalize_subject(&subject),
    };

    Ok(Message {
        id,
        message_id,
        from,
        subject,
        date,
        timestamp,
        flag_status,
        content: content_lines.join("\n"),
    })
}
