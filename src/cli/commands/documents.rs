//! Extraction, upload and deletion of documents.

use std::io::Write;
use std::path::Path;

use console::style;

use crate::assistant::{delete_remote_file, process_upload, UNKNOWN_FILE_NAME};
use crate::config::Settings;
use crate::extract::{DocumentKind, ExtractionResult, TextExtractor};
use crate::openai::OpenAiClient;
use crate::utils::format_size;

fn display_name(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}

/// Print the extracted text of a document.
pub async fn cmd_extract(settings: &Settings, file: &Path, ocr_only: bool) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file).await?;
    let name = display_name(file);
    let extractor = TextExtractor::from_config(&settings.extraction);

    let result: ExtractionResult = if ocr_only {
        if DocumentKind::detect(&name, &bytes) != Some(DocumentKind::Pdf) {
            anyhow::bail!("--ocr-only applies to PDF files");
        }
        let path = file.to_path_buf();
        tokio::task::spawn_blocking(move || extractor.ocr_pdf(&path, &name)).await??
    } else {
        extractor.extract_async(name, bytes).await?
    };

    eprintln!(
        "{} {} chars via {}{}",
        style("✓").green(),
        result.text.chars().count(),
        result.method,
        result
            .page_count
            .map(|n| format!(", {} pages", n))
            .unwrap_or_default()
    );

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", result.text)?;
    Ok(())
}

/// Extract a document and upload its text.
pub async fn cmd_upload(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file).await?;
    let name = display_name(file);
    eprintln!(
        "{} Uploading {} ({})",
        style("→").cyan(),
        name,
        format_size(bytes.len() as u64)
    );

    let extractor = TextExtractor::from_config(&settings.extraction);
    let openai = OpenAiClient::new(settings.openai.clone())?;

    match process_upload(&extractor, &openai, &name, bytes).await {
        Ok(info) => {
            eprintln!("{} Uploaded {}", style("✓").green(), info.filename);
            println!("{}", info.file_id);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", style("✗").red(), e.user_message());
            Err(e.into())
        }
    }
}

/// Delete an uploaded file.
pub async fn cmd_delete(settings: &Settings, file_id: &str) -> anyhow::Result<()> {
    let openai = OpenAiClient::new(settings.openai.clone())?;
    if !delete_remote_file(&openai, file_id, UNKNOWN_FILE_NAME).await {
        anyhow::bail!("file {} was not deleted", file_id);
    }
    println!("{} Deleted {}", style("✓").green(), file_id);
    Ok(())
}
