//! Thread assembly.
//!
//! Grouping is an exact-key partition on `Message::id` — no clustering or
//! fuzzy matching across ids.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::pipeline::types::{Message, Thread};

/// Group messages into threads by grouping id.
///
/// Preserves first-seen order of distinct ids and, within each thread,
/// the original message order. Messages with an empty id cannot be
/// grouped and are dropped.
pub fn group(messages: Vec<Message>) -> Vec<Thread> {
    let mut threads: Vec<Thread> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for message in messages {
        if message.id.is_empty() {
            warn!(subject = %message.subject, "Message has no grouping id; dropping");
            continue;
        }
        match index.get(&message.id) {
            Some(&i) => threads[i].messages.push(message),
            None => {
                index.insert(message.id.clone(), threads.len());
                threads.push(Thread {
                    id: message.id.clone(),
                    messages: vec![message],
                });
            }
        }
    }

    debug!(count = threads.len(), "Grouped messages into threads");
    threads
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_message(id: &str, subject: &str) -> Message {
        Message {
            id: id.into(),
            message_id: None,
            from: None,
            subject: subject.into(),
            date: None,
            timestamp: None,
            flag_status: None,
            content: String::new(),
        }
    }

    #[test]
    fn groups_by_exact_id() {
        let messages = vec![
            make_message("A", "first"),
            make_message("B", "second"),
            make_message("A", "third"),
        ];
        let threads = group(messages);
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].id, "A");
        assert_eq!(threads[0].messages.len(), 2);
        assert_eq!(threads[1].id, "B");
    }

    #[test]
    fn first_seen_order_preserved() {
        let messages = vec![
            make_message("Z", "a"),
            make_message("A", "b"),
            make_message("Z", "c"),
            make_message("M", "d"),
        ];
        let ids: Vec<String> = group(messages).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["Z", "A", "M"]);
    }

    #[test]
    fn insertion_order_within_thread() {
        let messages = vec![make_message("A", "one"), make_message("A", "two")];
        let threads = group(messages);
        assert_eq!(threads[0].messages[0].subject, "one");
        assert_eq!(threads[0].messages[1].subject, "two");
    }

    #[test]
    fn partition_covers_every_grouped_message() {
        let messages = vec![
            make_message("A", "1"),
            make_message("", "no id"),
            make_message("B", "2"),
            make_message("A", "3"),
        ];
        let with_id = messages.iter().filter(|m| !m.id.is_empty()).count();
        let threads = group(messages);
        let total: usize = threads.iter().map(|t| t.messages.len()).sum();
        assert_eq!(total, with_id);
    }

    #[test]
    fn empty_input_yields_no_threads() {
        assert!(group(Vec::new()).is_empty());
    }
}
