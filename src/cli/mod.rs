//! Command-line interface.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "lexassist")]
#[command(about = "Document-grounded assistant for Colombian constitutional law")]
#[command(version)]
pub struct Cli {
    /// Config file (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: 127.0.0.1:3000)
        bind: Option<String>,
    },

    /// Extract text from a PDF, DOCX or TXT file
    Extract {
        /// File to extract
        file: PathBuf,
        /// OCR every page of a PDF, ignoring its text layer
        #[arg(long)]
        ocr_only: bool,
    },

    /// Extract a document and upload it for the assistant
    Upload {
        /// File to upload
        file: PathBuf,
    },

    /// Delete an uploaded file
    Delete {
        /// File id returned by `upload`
        file_id: String,
    },

    /// Ask the assistant one question
    Ask {
        /// The question
        prompt: String,
        /// Continue an existing thread
        #[arg(short, long)]
        thread: Option<String>,
        /// Uploaded file ids to attach (repeatable)
        #[arg(short, long = "file")]
        files: Vec<String>,
    },

    /// List recent bills from the Chamber of Representatives
    Bills {
        /// Number of bills (default from config, 15)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check external tools and API credentials
    Check,

    /// Show the effective configuration
    Config,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (settings, config) = load_settings_with_options(LoadOptions {
        config_path: cli.config,
    })
    .await?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
            commands::cmd_serve(&settings, &bind).await
        }
        Commands::Extract { file, ocr_only } => {
            commands::cmd_extract(&settings, &file, ocr_only).await
        }
        Commands::Upload { file } => commands::cmd_upload(&settings, &file).await,
        Commands::Delete { file_id } => commands::cmd_delete(&settings, &file_id).await,
        Commands::Ask {
            prompt,
            thread,
            files,
        } => commands::cmd_ask(&settings, &prompt, thread.as_deref(), &files).await,
        Commands::Bills { limit, json } => commands::cmd_bills(&settings, limit, json).await,
        Commands::Check => commands::cmd_check(&settings).await,
        Commands::Config => commands::cmd_config(&config).await,
    }
}
