//! Ingestion-and-scheduling pipeline.
//!
//! Raw export → parser → thread assembly → candidate selection →
//! signature stripping → batch reply jobs. Every stage recovers from
//! per-unit failures by skipping the offending unit and logging.

pub mod dates;
pub mod parser;
pub mod processor;
pub mod scheduler;
pub mod signature;
pub mod threads;
pub mod types;

pub use processor::process_export;
pub use signature::SignatureStripper;
pub use types::{Message, ReplyCandidate, Thread};
