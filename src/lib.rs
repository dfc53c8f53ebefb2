//! Mail Nudge — stale-thread follow-up core.
//!
//! Turns a delimited mailbox export into threaded message records,
//! decides which flagged conversations have gone stale, and prepares
//! batch reply jobs for an LLM model chain. The surrounding application
//! owns all mail-client I/O and draft placement.

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
