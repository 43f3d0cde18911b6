use anyhow::{Context, Result, bail};

use eduplan_core::{GeminiClient, GenerationConfig};

/// Print the catalogue models usable for generation, marking the ones in the
/// configured fallback chain.
pub async fn run_models(config: &GenerationConfig) -> Result<()> {
    let Some(client) = GeminiClient::from_config(config).context("failed to build HTTP client")?
    else {
        bail!("no API key configured\nRun `eduplan init --api-key <KEY>` or export GEMINI_API_KEY.");
    };

    let models = client.list_models().await.context("failed to list models")?;
    if models.is_empty() {
        println!("No models support generateContent for this key.");
        return Ok(());
    }

    println!("{:<3}{:<40}NAME", "", "ID");
    for model in &models {
        let marker = if config.models.iter().any(|m| m == model.id) {
            "*"
        } else {
            ""
        };
        println!(
            "{:<3}{:<40}{}",
            marker,
            model.id,
            model.display_name.as_deref().unwrap_or("-")
        );
    }
    println!();
    println!("* = in the fallback chain ({})", chain_summary(config));
    Ok(())
}

fn chain_summary(config: &GenerationConfig) -> String {
    config.models.iter().collect::<Vec<_>>().join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use eduplan_core::ModelCandidates;

    #[test]
    fn chain_summary_keeps_order() {
        let config = GenerationConfig::new(None)
            .with_models(ModelCandidates::new(["b", "a"]).unwrap());
        assert_eq!(chain_summary(&config), "b -> a");
    }

    #[tokio::test]
    async fn listing_without_key_fails() {
        let err = run_models(&GenerationConfig::new(None)).await.unwrap_err();
        assert!(err.to_string().contains("no API key configured"));
    }
}
