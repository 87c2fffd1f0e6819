//! Text extraction from uploaded document bytes.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::docx::extract_docx_text;
use super::kind::DocumentKind;
use super::ocr::TesseractOcr;
use super::tools::{check_binary, handle_cmd_output, REQUIRED_TOOLS};
use crate::config::ExtractionConfig;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("No text could be extracted from {0}")]
    EmptyText(String),

    #[error("DOCX error: {0}")]
    Docx(String),

    #[error("Extraction task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of text extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted text content, trimmed.
    pub text: String,
    /// Method used for extraction.
    pub method: ExtractionMethod,
    /// Number of pages (PDFs only, when pdfinfo is available).
    pub page_count: Option<u32>,
}

/// Method used to extract text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// Text layer extracted with pdftotext.
    PdfToText,
    /// Pages rendered and read with Tesseract.
    TesseractOcr,
    /// WordprocessingML paragraphs.
    Docx,
    /// Decoded plain text.
    PlainText,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PdfToText => "pdftotext",
            Self::TesseractOcr => "tesseract",
            Self::Docx => "docx",
            Self::PlainText => "text",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Text extractor for uploaded documents.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    /// Minimum trimmed characters before a PDF text layer is trusted.
    min_text_chars: usize,
    ocr: TesseractOcr,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self {
            min_text_chars: 100,
            ocr: TesseractOcr::default(),
        }
    }
}

impl TextExtractor {
    /// Create a new text extractor.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_text_chars: config.min_text_chars,
            ocr: TesseractOcr::new(&config.ocr_language, config.ocr_dpi),
        }
    }

    /// Set minimum characters threshold for the PDF text layer.
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_text_chars = min_chars;
        self
    }

    /// Set the OCR engine settings.
    pub fn with_ocr(mut self, ocr: TesseractOcr) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn ocr(&self) -> &TesseractOcr {
        &self.ocr
    }

    /// Extract text from a file given as bytes, picking the method from the
    /// filename (falling back to content sniffing).
    pub fn extract_from_bytes(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<ExtractionResult, ExtractionError> {
        let kind = DocumentKind::detect(filename, bytes)
            .ok_or_else(|| ExtractionError::UnsupportedFileType(filename.to_string()))?;

        let result = match kind {
            DocumentKind::Pdf => {
                info!("Extracting PDF '{}'", filename);
                self.extract_pdf(filename, bytes)?
            }
            DocumentKind::Docx => {
                info!("Extracting DOCX '{}'", filename);
                ExtractionResult {
                    text: extract_docx_text(bytes)?,
                    method: ExtractionMethod::Docx,
                    page_count: None,
                }
            }
            DocumentKind::Text => {
                info!("Extracting TXT '{}'", filename);
                ExtractionResult {
                    text: decode_utf8_skip_invalid(bytes),
                    method: ExtractionMethod::PlainText,
                    page_count: None,
                }
            }
        };

        let text = result.text.trim().to_string();
        if text.is_empty() {
            return Err(ExtractionError::EmptyText(filename.to_string()));
        }

        Ok(ExtractionResult { text, ..result })
    }

    /// Async wrapper that keeps subprocess work off the runtime threads.
    pub async fn extract_async(
        &self,
        filename: String,
        bytes: Vec<u8>,
    ) -> Result<ExtractionResult, ExtractionError> {
        let extractor = self.clone();
        tokio::task::spawn_blocking(move || extractor.extract_from_bytes(&filename, &bytes))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))?
    }

    /// Extract a PDF's text layer, falling back to OCR when it is too sparse.
    fn extract_pdf(&self, filename: &str, bytes: &[u8]) -> Result<ExtractionResult, ExtractionError> {
        // Poppler tools read from disk; the temp file is removed on drop.
        let mut tmp = tempfile::Builder::new()
            .prefix("lexassist-")
            .suffix(".pdf")
            .tempfile()?;
        tmp.write_all(bytes)?;
        tmp.flush()?;

        let path = tmp.path();
        let page_count = self.get_pdf_page_count(path);

        let (text, method) = settle_pdf_text(
            filename,
            self.run_pdftotext(path),
            self.min_text_chars,
            || self.ocr.ocr_pdf(path, filename),
        )?;

        Ok(ExtractionResult {
            text,
            method,
            page_count,
        })
    }

    /// OCR every page of a PDF on disk, ignoring any text layer.
    pub fn ocr_pdf(&self, path: &Path, filename: &str) -> Result<ExtractionResult, ExtractionError> {
        let text = self.ocr.ocr_pdf(path, filename)?.trim().to_string();
        if text.is_empty() {
            return Err(ExtractionError::EmptyText(filename.to_string()));
        }
        Ok(ExtractionResult {
            text,
            method: ExtractionMethod::TesseractOcr,
            page_count: self.get_pdf_page_count(path),
        })
    }

    /// Run pdftotext on a PDF file.
    fn run_pdftotext(&self, file_path: &Path) -> Result<String, ExtractionError> {
        let output = Command::new("pdftotext")
            .args(["-layout", "-enc", "UTF-8"])
            .arg(file_path)
            .arg("-") // Output to stdout
            .output();

        handle_cmd_output(output, "pdftotext (install poppler-utils)", "pdftotext failed")
    }

    /// Get the page count of a PDF.
    pub fn get_pdf_page_count(&self, file_path: &Path) -> Option<u32> {
        let output = Command::new("pdfinfo").arg(file_path).output().ok()?;

        if !output.status.success() {
            debug!("pdfinfo failed for {}", file_path.display());
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_pdfinfo_pages(&stdout)
    }

    /// Check if required tools are available.
    pub fn check_tools() -> Vec<(String, bool)> {
        REQUIRED_TOOLS
            .iter()
            .map(|tool| (tool.to_string(), check_binary(tool)))
            .collect()
    }
}

/// Pick between a PDF's text layer and OCR.
///
/// The layer is kept when its trimmed length reaches `min_chars`; otherwise
/// OCR runs. A missing `pdftotext` counts as an empty layer. When OCR fails
/// a short but non-empty layer is kept, else the OCR error is returned.
fn settle_pdf_text<F>(
    filename: &str,
    layer: Result<String, ExtractionError>,
    min_chars: usize,
    ocr: F,
) -> Result<(String, ExtractionMethod), ExtractionError>
where
    F: FnOnce() -> Result<String, ExtractionError>,
{
    let layer_text = match layer {
        Ok(text) => text,
        Err(e) => {
            warn!("pdftotext unavailable for '{}': {}", filename, e);
            String::new()
        }
    };

    let layer_chars = layer_text.trim().chars().count();
    if layer_chars >= min_chars {
        return Ok((layer_text, ExtractionMethod::PdfToText));
    }

    warn!(
        "Text layer of '{}' is too short ({} < {} chars), trying OCR",
        filename, layer_chars, min_chars
    );

    match ocr() {
        Ok(text) => Ok((text, ExtractionMethod::TesseractOcr)),
        // A short text layer still beats nothing.
        Err(e) if layer_chars > 0 => {
            warn!("OCR failed for '{}': {}, keeping text layer", filename, e);
            Ok((layer_text, ExtractionMethod::PdfToText))
        }
        Err(e) => Err(e),
    }
}

fn parse_pdfinfo_pages(stdout: &str) -> Option<u32> {
    stdout
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

/// Decode UTF-8, dropping invalid byte sequences instead of replacing them.
fn decode_utf8_skip_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(len) => bytes = &rest[len..],
                    // Truncated sequence at the end of input.
                    None => break,
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::docx::tests::build_docx;
    use super::*;

    #[test]
    fn test_check_tools() {
        let tools = TextExtractor::check_tools();
        assert_eq!(tools.len(), REQUIRED_TOOLS.len());
        for (tool, available) in tools {
            println!("{}: {}", tool, if available { "found" } else { "missing" });
        }
    }

    #[test]
    fn test_extract_text_file_trims_and_drops_invalid_bytes() {
        let extractor = TextExtractor::new();
        let bytes = b"  Sentencia C-355\xff/06  \n";
        let result = extractor.extract_from_bytes("fallo.TXT", bytes).unwrap();
        assert_eq!(result.text, "Sentencia C-355/06");
        assert_eq!(result.method, ExtractionMethod::PlainText);
        assert_eq!(result.page_count, None);
    }

    #[test]
    fn test_extract_docx() {
        let extractor = TextExtractor::new();
        let docx = build_docx("<w:p><w:r><w:t>Proyecto de Ley 001</w:t></w:r></w:p>");
        let result = extractor.extract_from_bytes("proyecto.docx", &docx).unwrap();
        assert_eq!(result.text, "Proyecto de Ley 001");
        assert_eq!(result.method, ExtractionMethod::Docx);
    }

    #[test]
    fn test_unsupported_extension() {
        let extractor = TextExtractor::new();
        let err = extractor
            .extract_from_bytes("hoja.xlsx", b"whatever")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFileType(_)));
    }

    #[test]
    fn test_whitespace_only_text_is_empty() {
        let extractor = TextExtractor::new();
        let err = extractor
            .extract_from_bytes("vacio.txt", b" \n\t ")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyText(_)));
    }

    #[test]
    fn test_decode_skips_invalid_sequences() {
        assert_eq!(decode_utf8_skip_invalid(b"a\xc3\xa9b"), "aéb");
        assert_eq!(decode_utf8_skip_invalid(b"a\x80b\xfe"), "ab");
        // Truncated multi-byte sequence at the end.
        assert_eq!(decode_utf8_skip_invalid(b"ley\xc3"), "ley");
    }

    fn ocr_ok(text: &'static str) -> impl FnOnce() -> Result<String, ExtractionError> {
        move || Ok(text.to_string())
    }

    fn ocr_err() -> Result<String, ExtractionError> {
        Err(ExtractionError::ToolNotFound("tesseract".into()))
    }

    #[test]
    fn test_settle_keeps_long_layer_without_ocr() {
        let (text, method) = settle_pdf_text(
            "ley.pdf",
            Ok("Artículo 1".to_string()),
            10,
            || panic!("OCR must not run"),
        )
        .unwrap();
        assert_eq!(text, "Artículo 1");
        assert_eq!(method, ExtractionMethod::PdfToText);
    }

    #[test]
    fn test_settle_threshold_counts_trimmed_chars() {
        // 26 raw chars, 6 once trimmed.
        let padded = format!("{}Ley 80{}", " ".repeat(10), "\n".repeat(10));
        let (text, method) =
            settle_pdf_text("ley.pdf", Ok(padded), 10, ocr_ok("texto escaneado")).unwrap();
        assert_eq!(text, "texto escaneado");
        assert_eq!(method, ExtractionMethod::TesseractOcr);
    }

    #[test]
    fn test_settle_missing_pdftotext_goes_to_ocr() {
        let layer = Err(ExtractionError::ToolNotFound("pdftotext".into()));
        let (text, method) = settle_pdf_text("ley.pdf", layer, 10, ocr_ok("ocr")).unwrap();
        assert_eq!(text, "ocr");
        assert_eq!(method, ExtractionMethod::TesseractOcr);

        let layer = Err(ExtractionError::ToolNotFound("pdftotext".into()));
        let err = settle_pdf_text("ley.pdf", layer, 10, ocr_err).unwrap_err();
        assert!(matches!(err, ExtractionError::ToolNotFound(_)));
    }

    #[test]
    fn test_settle_keeps_short_layer_when_ocr_fails() {
        let (text, method) =
            settle_pdf_text("ley.pdf", Ok(" Ley 80 ".to_string()), 100, ocr_err).unwrap();
        assert_eq!(text, " Ley 80 ");
        assert_eq!(method, ExtractionMethod::PdfToText);

        let err = settle_pdf_text("ley.pdf", Ok("   ".to_string()), 100, ocr_err).unwrap_err();
        assert!(matches!(err, ExtractionError::ToolNotFound(_)));
    }

    #[test]
    fn test_parse_pdfinfo_pages() {
        let stdout = "Producer:       Ghostscript\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_pdfinfo_pages(stdout), Some(12));
        assert_eq!(parse_pdfinfo_pages("Title: x\n"), None);
    }

    #[tokio::test]
    async fn test_extract_async_runs_off_runtime() {
        let extractor = TextExtractor::new();
        let result = extractor
            .extract_async("nota.txt".to_string(), b"Articulo 86".to_vec())
            .await
            .unwrap();
        assert_eq!(result.text, "Articulo 86");
    }
}
