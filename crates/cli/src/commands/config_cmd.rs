//! `askpaper config`: Configuration management commands.

use askpaper_config::AppConfig;

pub fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            if !config.has_api_key() {
                warnings.push("No API key set (set OPENAI_API_KEY or OPENROUTER_API_KEY env var)".to_string());
            }

            for name in &config.fallback_providers {
                if *name == config.default_provider {
                    warnings.push(format!("Fallback provider '{name}' is also the default provider"));
                }
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            let pipeline = &config.pipeline;
            println!();
            println!("   Provider:    {}", config.default_provider);
            println!("   Model:       {}", config.default_model);
            println!("   Ceiling:     {} tokens", pipeline.llm_max_tokens);
            println!("   Chunks:      up to {}", pipeline.max_contexts);
            println!("   Trade-offs:  0..={}", pipeline.max_trade_off());
            println!("   Diagnostics: {}", if config.diagnostics.enabled { "on" } else { "off" });
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", config.redacted_toml());
    Ok(())
}

pub fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
