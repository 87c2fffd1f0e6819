//! Environment checks and configuration display.

use console::style;

use crate::config::{default_config_path, Config, Settings};
use crate::extract::TextExtractor;

/// Report external tools and credentials.
pub async fn cmd_check(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("Extraction Tools").bold());
    println!("{}", "-".repeat(50));

    let mut all_found = true;
    for (tool, available) in TextExtractor::check_tools() {
        let status = if available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }
    if !all_found {
        println!(
            "  {}",
            style("Install poppler-utils and tesseract-ocr (with the spa language pack)").dim()
        );
    }

    println!("\n{}", style("Assistant API").bold());
    println!("{}", "-".repeat(50));
    let openai = &settings.openai;
    let key_status = if openai.api_key.is_some() {
        style(format!("✓ {}", openai.redacted_api_key())).green()
    } else {
        style("✗ OPENAI_API_KEY not set".to_string()).red()
    };
    println!("  {:<15} {}", "API key", key_status);
    let assistant_status = match &openai.assistant_id {
        Some(id) => style(format!("✓ {}", id)).green(),
        None => style("✗ OPENAI_ASSISTANT_ID not set".to_string()).red(),
    };
    println!("  {:<15} {}", "Assistant", assistant_status);
    println!("  {:<15} {}", "Endpoint", openai.base_url);

    Ok(())
}

/// Print the effective configuration.
pub async fn cmd_config(config: &Config) -> anyhow::Result<()> {
    match &config.source_path {
        Some(path) => eprintln!("{} Loaded from {}", style("→").dim(), path.display()),
        None => eprintln!(
            "{} No config file found (defaults + environment); create {} to customize",
            style("→").dim(),
            default_config_path().display()
        ),
    }

    println!("{}", toml::to_string_pretty(config)?);
    println!("# openai.api_key = {}", config.openai.redacted_api_key());
    Ok(())
}
