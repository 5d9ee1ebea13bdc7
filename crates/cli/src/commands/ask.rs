//! `askpaper ask`: Answer a question about a paper.

use std::path::Path;

use askpaper_config::AppConfig;
use askpaper_core::Error;
use askpaper_pipeline::{AskOptions, Diagnostics, PaperQa};

pub async fn run(
    paper: &Path,
    question: &str,
    trade_off: usize,
    fuse: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| Error::Config {
        message: format!("Failed to load config: {e}"),
    })?;

    // Check for API key early: give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENAI_API_KEY     = 'sk-...'         (OpenAI)");
        eprintln!("    OPENROUTER_API_KEY = 'sk-or-v1-...'   (OpenRouter)");
        eprintln!("    ASKPAPER_API_KEY   = 'sk-...'         (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err(Error::Config {
            message: "No API key found. See above for setup instructions.".into(),
        }
        .into());
    }

    let document = super::load_paper(paper)?;
    tracing::debug!(
        paper = %paper.display(),
        title = %document.title,
        sections = document.sections().len(),
        "Loaded paper"
    );

    let router = askpaper_providers::router::build_from_config(&config);
    let provider = router.default().ok_or_else(|| Error::Config {
        message: format!("No provider named '{}' is configured", config.default_provider),
    })?;

    let qa = PaperQa::new(provider, &config.default_model, config.pipeline.clone())?
        .with_diagnostics(Diagnostics::from_config(&config.diagnostics));

    let answer = qa
        .answer_question(question, document, AskOptions { fuse, trade_off })
        .await?;
    println!("{answer}");

    Ok(())
}
