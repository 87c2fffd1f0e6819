//! Document kind detection from file names and content.

/// Extensions accepted for upload.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "docx"];

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Kinds of documents the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    /// Detect the kind from the file extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if lower.ends_with(".docx") {
            Some(Self::Docx)
        } else if lower.ends_with(".txt") {
            Some(Self::Text)
        } else {
            None
        }
    }

    /// Detect the kind from magic bytes. Plain text has no signature and is
    /// never sniffed.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match infer::get(bytes).map(|t| t.mime_type()) {
            Some("application/pdf") => Some(Self::Pdf),
            Some(DOCX_MIME) => Some(Self::Docx),
            _ => None,
        }
    }

    /// Resolve the kind from the name first, then from the content.
    pub fn detect(filename: &str, bytes: &[u8]) -> Option<Self> {
        Self::from_filename(filename).or_else(|| Self::sniff(bytes))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Text => "txt",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_filename_is_case_insensitive() {
        assert_eq!(DocumentKind::from_filename("Ley_2023.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_filename("demanda.Docx"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_filename("notas.txt"), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_filename("scan.png"), None);
        assert_eq!(DocumentKind::from_filename("pdf"), None);
    }

    #[test]
    fn test_sniff_pdf_magic() {
        let bytes = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj\n";
        assert_eq!(DocumentKind::sniff(bytes), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::sniff(b"just some words"), None);
    }

    #[test]
    fn test_detect_prefers_extension() {
        let pdf_bytes = b"%PDF-1.4\n";
        assert_eq!(
            DocumentKind::detect("actually.txt", pdf_bytes),
            Some(DocumentKind::Text)
        );
        assert_eq!(
            DocumentKind::detect("no_extension", pdf_bytes),
            Some(DocumentKind::Pdf)
        );
    }
}
