//! Shared types for the ingestion pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flag status value that makes a thread reply-eligible. Every other
/// status is free text with no business meaning.
pub const ACTIVE_FLAG: &str = "Active";

// ── Message ─────────────────────────────────────────────────────────

/// A single email turn from the mailbox export.
///
/// Immutable once parsed. `content` holds the body verbatim; cleaned
/// copies are derived downstream, never written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Conversation-grouping key: the explicit `ID:` header when present,
    /// otherwise the normalized subject.
    pub id: String,
    /// Opaque identifier used to address this specific message for a
    /// reply. Distinct from `id`.
    pub message_id: Option<String>,
    /// Sender display string as exported.
    pub from: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Raw `Date:` header value.
    pub date: Option<String>,
    /// Resolved header timestamp, or `None` when the date failed to parse.
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-text flag status from the export.
    pub flag_status: Option<String>,
    /// Body text between the body markers, internal lines untouched.
    pub content: String,
}

impl Message {
    /// Whether this message carries the Active flag.
    pub fn is_active(&self) -> bool {
        self.flag_status.as_deref() == Some(ACTIVE_FLAG)
    }
}

// ── Thread ──────────────────────────────────────────────────────────

/// An ordered list of messages sharing the same grouping id.
///
/// Insertion order, not chronological order. Sort by `timestamp` where
/// chronology matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    /// Grouping id, assigned at parse time.
    pub id: String,
    /// Messages in first-seen order.
    pub messages: Vec<Message>,
}

impl Thread {
    /// Subject of the thread, taken from its first message.
    pub fn subject(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.subject.as_str())
            .unwrap_or("No Subject")
    }

    /// Whether any message in the thread carries the Active flag.
    pub fn has_active_flag(&self) -> bool {
        self.messages.iter().any(Message::is_active)
    }
}

// ── Reply candidate ─────────────────────────────────────────────────

/// A thread selected for an automated follow-up, with the message the
/// reply should address. Ephemeral: rebuilt from scratch every run and
/// discarded afterwards.
#[derive(Debug, Clone)]
pub struct ReplyCandidate {
    /// The source thread.
    pub thread: Thread,
    /// The message selected to receive the reply.
    pub target: Message,
    /// Thread subject, for logging and job construction.
    pub subject: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_message(flag_status: Option<&str>) -> Message {
        Message {
            id: "1".into(),
            message_id: Some("<a@example.com>".into()),
            from: Some("alice@example.com".into()),
            subject: "Quarterly report".into(),
            date: None,
            timestamp: None,
            flag_status: flag_status.map(String::from),
            content: "Hello".into(),
        }
    }

    #[test]
    fn active_flag_is_exact() {
        assert!(make_message(Some("Active")).is_active());
        assert!(!make_message(Some("Completed")).is_active());
        assert!(!make_message(Some("active")).is_active());
        assert!(!make_message(None).is_active());
    }

    #[test]
    fn thread_active_when_any_message_active() {
        let thread = Thread {
            id: "1".into(),
            messages: vec![make_message(Some("Completed")), make_message(Some("Active"))],
        };
        assert!(thread.has_active_flag());

        let thread = Thread {
            id: "1".into(),
            messages: vec![make_message(None)],
        };
        assert!(!thread.has_active_flag());
    }

    #[test]
    fn thread_subject_from_first_message() {
        let thread = Thread {
            id: "1".into(),
            messages: vec![make_message(None)],
        };
        assert_eq!(thread.subject(), "Quarterly report");

        let empty = Thread {
            id: "1".into(),
            messages: vec![],
        };
        assert_eq!(empty.subject(), "No Subject");
    }
}
