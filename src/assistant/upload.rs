//! Upload pipeline: extract text, send it to the assistant's file store.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use super::session::FileInfo;
use crate::extract::{DocumentKind, ExtractionError, TextExtractor};
use crate::openai::{OpenAiClient, OpenAiError};

/// Why an upload was rejected.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("empty file name or content")]
    InvalidFile,

    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("extraction failed: {0}")]
    Extraction(#[source] ExtractionError),

    #[error("upload failed: {0}")]
    Upload(#[from] OpenAiError),

    #[error("session already holds {0} files")]
    FileLimit(usize),

    #[error("another operation is in progress")]
    Busy,

    #[error("internal error: {0}")]
    Internal(String),
}

impl UploadError {
    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            UploadError::InvalidFile => "Archivo inválido.".to_string(),
            UploadError::Unsupported(_) => "Formato de archivo no soportado.".to_string(),
            UploadError::Extraction(_) => "No se pudo extraer texto.".to_string(),
            UploadError::Upload(_) => "Fallo al subir a OpenAI.".to_string(),
            UploadError::FileLimit(n) => format!("Solo se permiten {} archivos por conversación.", n),
            UploadError::Busy => "Hay una operación en curso, inténtalo de nuevo.".to_string(),
            UploadError::Internal(_) => "Error interno del servidor.".to_string(),
        }
    }
}

impl From<ExtractionError> for UploadError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::Task(msg) => UploadError::Internal(msg),
            ExtractionError::UnsupportedFileType(name) => UploadError::Unsupported(name),
            other => UploadError::Extraction(other),
        }
    }
}

/// JSON envelope returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadResponse {
    Success { file_info: FileInfo },
    Error { message: String },
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadResponse::Success { .. })
    }
}

impl From<Result<FileInfo, UploadError>> for UploadResponse {
    fn from(result: Result<FileInfo, UploadError>) -> Self {
        match result {
            Ok(file_info) => UploadResponse::Success { file_info },
            Err(e) => UploadResponse::Error {
                message: e.user_message(),
            },
        }
    }
}

/// Extract the text of an uploaded document and upload it for file search.
pub async fn process_upload(
    extractor: &TextExtractor,
    openai: &OpenAiClient,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<FileInfo, UploadError> {
    if filename.trim().is_empty() || bytes.is_empty() {
        return Err(UploadError::InvalidFile);
    }
    if DocumentKind::detect(filename, &bytes).is_none() {
        warn!("Rejected upload '{}': unsupported type", filename);
        return Err(UploadError::Unsupported(filename.to_string()));
    }

    info!("Processing upload '{}' ({} bytes)", filename, bytes.len());
    let extracted = extractor
        .extract_async(filename.to_string(), bytes)
        .await
        .map_err(|e| {
            error!("Extraction failed for '{}': {}", filename, e);
            UploadError::from(e)
        })?;
    info!(
        "Extracted {} chars from '{}' using {}",
        extracted.text.chars().count(),
        filename,
        extracted.method
    );

    let file = openai
        .upload_text(&extracted.text, filename)
        .await
        .map_err(|e| {
            error!("Upload of '{}' failed: {}", filename, e);
            UploadError::Upload(e)
        })?;

    Ok(FileInfo::new(&file.id, filename))
}

/// Delete an uploaded file, logging it under `display_name`. Returns whether
/// the service confirmed the deletion; failures are logged, not returned.
pub async fn delete_remote_file(openai: &OpenAiClient, file_id: &str, display_name: &str) -> bool {
    match openai.delete_file(file_id).await {
        Ok(true) => {
            info!("Deleted '{}' ({})", display_name, file_id);
            true
        }
        Ok(false) => {
            warn!("Service did not delete '{}' ({})", display_name, file_id);
            false
        }
        Err(e) => {
            error!("Could not delete '{}' ({}): {}", display_name, file_id, e);
            false
        }
    }
}
