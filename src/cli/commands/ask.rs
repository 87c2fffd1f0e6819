//! One-shot assistant question.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::assistant::{Conversation, ToolRegistry};
use crate::config::Settings;
use crate::openai::OpenAiClient;
use crate::scrapers::CamaraScraper;

/// Ask the assistant a question and print the formatted reply.
pub async fn cmd_ask(
    settings: &Settings,
    prompt: &str,
    thread: Option<&str>,
    file_ids: &[String],
) -> anyhow::Result<()> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        anyhow::bail!("prompt is empty");
    }

    let openai = Arc::new(OpenAiClient::new(settings.openai.clone())?);
    let scraper = Arc::new(CamaraScraper::new(settings.scraper.clone())?);
    let conversation = Conversation::new(openai, ToolRegistry::with_defaults(scraper));

    let thread_id = match thread {
        Some(id) => id.to_string(),
        None => conversation.start_thread().await?,
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Consultando al asistente...");
    pb.enable_steady_tick(Duration::from_millis(120));

    let result = conversation.respond(&thread_id, prompt, file_ids, &[]).await;
    pb.finish_and_clear();

    let reply = result?;
    println!("{}", reply);
    eprintln!(
        "\n  {} Continue with --thread {}",
        style("→").dim(),
        thread_id
    );
    Ok(())
}
