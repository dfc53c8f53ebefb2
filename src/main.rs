use std::io::Read;

use mail_nudge::config::RunConfig;
use mail_nudge::error::ConfigError;
use mail_nudge::llm::{self, CandidateModel};
use mail_nudge::pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RunConfig::from_env()?;

    eprintln!("Mail Nudge v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Staleness threshold: {} days", config.staleness_days);
    if let Some(ref preferred) = config.preferred_model {
        eprintln!("   Preferred model: {}", preferred);
    }

    // Raw export: first argument as a file path, stdin otherwise.
    let raw_export = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let gemini_key = std::env::var("GEMINI_API_KEY")
        .ok()
        .map(secrecy::SecretString::from);
    let openai_key = std::env::var("OPENAI_API_KEY")
        .ok()
        .map(secrecy::SecretString::from);
    if gemini_key.is_none() && openai_key.is_none() {
        return Err(
            ConfigError::MissingEnvVar("GEMINI_API_KEY or OPENAI_API_KEY".to_string()).into(),
        );
    }

    let models: Vec<CandidateModel> = llm::candidate_models(gemini_key, openai_key)?;
    eprintln!(
        "   Models: {}\n",
        models
            .iter()
            .map(|m| m.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let replies =
        pipeline::process_export(&raw_export, &config, &models, chrono::Utc::now()).await;

    // The drafting collaborator consumes this mapping.
    println!("{}", serde_json::to_string_pretty(&replies)?);
    Ok(())
}
