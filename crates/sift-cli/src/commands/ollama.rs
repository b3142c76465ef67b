//! Ollama-related command implementations

use anyhow::Result;
use sift_core::ai::{AIBackend, AIClient, OllamaBackend};
use sift_core::{BackendKind, Classifier, Config, ModelClassifier, PromptLibrary, RuleTable};

use super::truncate;

/// Test the Ollama connection and classify sample descriptions
pub async fn cmd_ollama_test(
    config: &Config,
    description: Option<&str>,
    model: Option<&str>,
) -> Result<()> {
    println!("🔍 Testing Ollama connection...\n");

    if config.ai.backend != BackendKind::Ollama {
        println!(
            "  ⚠️  Configured backend is '{}'; testing Ollama anyway",
            config.ai.backend
        );
    }

    let model = model.unwrap_or(&config.ai.model);
    println!("  Host:    {}", config.ai.host);
    println!("  Model:   {}", model);
    println!("  Timeout: {}s\n", config.ai.timeout.as_secs());

    let backend = OllamaBackend::new(
        &config.ai.host,
        model,
        config.ai.timeout,
        config.ai.temperature,
    )?;

    print!("Checking Ollama availability... ");
    if backend.health_check().await {
        println!("✅ Connected");
    } else {
        println!("❌ Failed");
        println!("\n⚠️  Could not connect to Ollama at {}", config.ai.host);
        println!("\nTo set up Ollama:");
        println!("  1. Install Ollama: https://ollama.ai/download");
        println!("  2. Start the server: ollama serve");
        println!("  3. Pull the model: ollama pull {}", model);
        println!("  4. Set environment variable: export OLLAMA_HOST={}", config.ai.host);
        return Ok(());
    }

    let samples: Vec<&str> = match description {
        Some(d) => vec![d],
        None => vec![
            "SWIGGY ORDER 88231",
            "UBER *TRIP HELP.UBER.COM",
            "AWS EMEA INVOICE",
            "AIRTEL POSTPAID BILL",
            "CORNER BAKERY",
        ],
    };

    // Empty rule table so every sample reaches the model
    let classifier = Classifier::new(
        config.categories.clone(),
        RuleTable::new(),
        ModelClassifier::with_prompts(AIClient::Ollama(backend), &PromptLibrary::new())?,
    );

    println!("\n📋 Testing classification...\n");
    for sample in samples {
        let result = classifier.classify_one(sample).await;
        println!(
            "  \"{}\" → {} ({:.2}, {}) {}",
            sample,
            result.category,
            result.confidence,
            result.method,
            truncate(&result.reason, 60)
        );
    }

    println!("\n✅ Ollama test complete");
    Ok(())
}
