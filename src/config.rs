//! Run configuration.
//!
//! The core never reads ambient process state; the binary builds a
//! `RunConfig` from the environment and passes it down explicitly.

use crate::error::ConfigError;

/// Default staleness threshold in days.
pub const DEFAULT_STALENESS_DAYS: i64 = 7;

/// Fallback persona when no system prompt file is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Per-run configuration, supplied by the caller at invocation time.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Minimum elapsed days since last activity before a flagged thread is
    /// due for a follow-up. The boundary is inclusive: a thread exactly at
    /// the threshold is not yet due.
    pub staleness_days: i64,
    /// Persona/instructions prepended to every generation request.
    pub system_prompt: String,
    /// Model id tried first when present in the candidate list.
    pub preferred_model: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            staleness_days: DEFAULT_STALENESS_DAYS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            preferred_model: None,
        }
    }
}

impl RunConfig {
    /// Build config from environment variables.
    ///
    /// `NUDGE_STALENESS_DAYS` — integer days (default 7).
    /// `NUDGE_SYSTEM_PROMPT_PATH` — file holding the system prompt.
    /// `NUDGE_PREFERRED_MODEL` — model id to try first.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_parts(
            std::env::var("NUDGE_STALENESS_DAYS").ok().as_deref(),
            std::env::var("NUDGE_SYSTEM_PROMPT_PATH").ok().as_deref(),
            std::env::var("NUDGE_PREFERRED_MODEL").ok().as_deref(),
        )
    }

    /// Build config from raw values; `None` falls back to defaults.
    ///
    /// An unset threshold or prompt path is fine; a set-but-broken one is a
    /// hard error, since the caller asked for something specific.
    pub fn from_parts(
        staleness_days: Option<&str>,
        system_prompt_path: Option<&str>,
        preferred_model: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let staleness_days = match staleness_days {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "NUDGE_STALENESS_DAYS".to_string(),
                message: format!("expected integer days, got '{raw}'"),
            })?,
            None => DEFAULT_STALENESS_DAYS,
        };

        let system_prompt = match system_prompt_path {
            Some(path) => std::fs::read_to_string(path)?,
            None => DEFAULT_SYSTEM_PROMPT.to_string(),
        };

        Ok(Self {
            staleness_days,
            system_prompt,
            preferred_model: preferred_model
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from),
        })
    }
}
