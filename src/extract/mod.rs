//! Text extraction module.
//!
//! Turns uploaded document bytes into plain text using:
//! - pdftotext (Poppler) for PDFs with an embedded text layer
//! - Tesseract OCR for scanned PDFs whose text layer is missing or too sparse
//! - a WordprocessingML reader for DOCX files
//! - lossy UTF-8 decoding for plain text

mod docx;
mod extractor;
mod kind;
mod ocr;
mod tools;

pub use docx::extract_docx_text;
pub use extractor::{ExtractionError, ExtractionMethod, ExtractionResult, TextExtractor};
pub use kind::{DocumentKind, SUPPORTED_EXTENSIONS};
pub use ocr::TesseractOcr;
pub use tools::{check_binary, REQUIRED_TOOLS};
