//! `askpaper doctor`: Diagnose system health.

use askpaper_config::AppConfig;
use askpaper_pipeline::Tokenizer;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 AskPaper Doctor: System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    // Check tokenizer
    match Tokenizer::cl100k() {
        Ok(tokenizer) => println!(
            "  ✅ Tokenizer cl100k_base loaded (\"hello world\" = {} tokens)",
            tokenizer.count("hello world")
        ),
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ℹ️  No config file at {}, using defaults", config_path.display());
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            println!(
                "  ✅ Token ceiling {} with up to {} chunks",
                config.pipeline.llm_max_tokens, config.pipeline.max_contexts
            );

            // Check API key
            if config.has_api_key() {
                println!("  ✅ API key configured");

                // Check provider
                let router = askpaper_providers::router::build_from_config(&config);
                match router.default() {
                    Some(provider) => match provider.health_check().await {
                        Ok(true) => println!("  ✅ Provider {} reachable", provider.name()),
                        Ok(false) => {
                            println!("  ⚠️  Provider {} answered but reports unhealthy", provider.name());
                            issues += 1;
                        }
                        Err(e) => {
                            println!("  ❌ Provider {} unreachable: {e}", provider.name());
                            issues += 1;
                        }
                    },
                    None => {
                        println!("  ❌ No default provider configured");
                        issues += 1;
                    }
                }
            } else {
                println!("  ⚠️  No API key configured: set OPENAI_API_KEY or add api_key to config.toml");
                issues += 1;
            }

            if config.diagnostics.enabled {
                println!("  ℹ️  Diagnostics dumps go to {}", config.diagnostics.dir.display());
            }
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
