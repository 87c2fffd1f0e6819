//! lexassist - document-grounded legal assistant.
//!
//! Extracts text from uploaded legal documents (with OCR for scanned PDFs),
//! hands them to a hosted assistant for file search, and scrapes recent
//! bills from the Chamber of Representatives.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lexassist::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let default_filter = if cli::is_verbose() {
        "lexassist=info"
    } else {
        "lexassist=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
