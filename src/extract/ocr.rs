//! Tesseract OCR over rendered PDF pages.
//!
//! Pages are rasterised with `pdftoppm` into a temporary directory and each
//! image is fed to `tesseract`. The directory is removed when it drops.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use tracing::{info, warn};

use super::extractor::ExtractionError;
use super::tools::{check_binary, check_cmd_status, handle_cmd_output};

/// Tesseract-backed OCR for scanned documents.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    /// Tesseract language setting (e.g. "spa+eng").
    language: String,
    /// Render resolution for PDF pages.
    dpi: u32,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            language: "spa+eng".to_string(),
            dpi: 200,
        }
    }
}

impl TesseractOcr {
    pub fn new(language: &str, dpi: u32) -> Self {
        Self {
            language: language.to_string(),
            dpi,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Whether both the renderer and the OCR engine are installed.
    pub fn is_available(&self) -> bool {
        check_binary("tesseract") && check_binary("pdftoppm")
    }

    /// OCR every page of a PDF, logging progress per page.
    ///
    /// Pages that fail are skipped; an error is returned only when no page
    /// produced output.
    pub fn ocr_pdf(&self, pdf_path: &Path, filename: &str) -> Result<String, ExtractionError> {
        let temp_dir = TempDir::new()?;
        let images = self.render_pages(pdf_path, temp_dir.path())?;
        ocr_pages(&images, filename, |image| self.ocr_image(image))
    }

    /// Run Tesseract on a single image.
    pub fn ocr_image(&self, image_path: &Path) -> Result<String, ExtractionError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        handle_cmd_output(output, "tesseract (install tesseract-ocr)", "tesseract failed")
    }

    /// Rasterise all pages of a PDF and return the images in page order.
    fn render_pages(&self, pdf_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        let dpi = self.dpi.to_string();
        let status = Command::new("pdftoppm")
            .args(["-png", "-r", &dpi])
            .arg(pdf_path)
            .arg(output_dir.join("page"))
            .status();

        check_cmd_status(
            status,
            "pdftoppm (install poppler-utils)",
            "pdftoppm failed to convert PDF",
        )?;

        // pdftoppm pads page numbers to a fixed width per document, so a
        // lexicographic sort is page order.
        let mut images: Vec<PathBuf> = std::fs::read_dir(output_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
            .collect();
        images.sort();

        if images.is_empty() {
            return Err(ExtractionError::ExtractionFailed(
                "No images generated from PDF".to_string(),
            ));
        }

        Ok(images)
    }
}

/// Concatenate per-page OCR output, one line break after each page.
///
/// Failed pages are logged and skipped. The last failure is returned only
/// when every page failed.
pub(super) fn ocr_pages<F>(
    images: &[PathBuf],
    filename: &str,
    mut ocr_page: F,
) -> Result<String, ExtractionError>
where
    F: FnMut(&Path) -> Result<String, ExtractionError>,
{
    let total_pages = images.len();
    let mut text = String::new();
    let mut succeeded = 0usize;
    let mut last_error = None;

    for (i, image_path) in images.iter().enumerate() {
        let page_num = i + 1;
        info!("OCR page {}/{} of '{}'", page_num, total_pages, filename);
        match ocr_page(image_path) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
                succeeded += 1;
            }
            Err(e) => {
                warn!("OCR failed for page {} of '{}': {}", page_num, filename, e);
                last_error = Some(e);
            }
        }
    }

    match (succeeded, last_error) {
        (0, Some(e)) => Err(e),
        _ => Ok(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let ocr = TesseractOcr::default();
        assert_eq!(ocr.language(), "spa+eng");
        assert_eq!(ocr.dpi(), 200);
    }

    fn pages(n: usize) -> Vec<PathBuf> {
        (1..=n).map(|i| PathBuf::from(format!("page-{}.png", i))).collect()
    }

    #[test]
    fn test_failed_pages_are_skipped() {
        let text = ocr_pages(&pages(3), "escaneo.pdf", |image| {
            if image.ends_with("page-2.png") {
                Err(ExtractionError::ExtractionFailed("tesseract failed".into()))
            } else {
                Ok(format!("texto {}", image.display()))
            }
        })
        .unwrap();
        assert_eq!(text, "texto page-1.png\ntexto page-3.png\n");
    }

    #[test]
    fn test_all_pages_failing_returns_error() {
        let mut calls = 0;
        let err = ocr_pages(&pages(2), "escaneo.pdf", |_| {
            calls += 1;
            Err(ExtractionError::ToolNotFound("tesseract".into()))
        })
        .unwrap_err();
        assert_eq!(calls, 2);
        assert!(matches!(err, ExtractionError::ToolNotFound(_)));
    }

    #[test]
    fn test_ocr_missing_file_fails() {
        let ocr = TesseractOcr::default();
        let result = ocr.ocr_pdf(Path::new("/nonexistent/lexassist.pdf"), "lexassist.pdf");
        assert!(result.is_err());
    }
}
