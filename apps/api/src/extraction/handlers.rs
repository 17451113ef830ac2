//! Axum route handler for resume uploads.

use axum::{extract::Multipart, Json};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::extraction::{DocumentFormat, ExtractionError, ResumeDocument};

#[derive(Debug, Serialize)]
pub struct ParseResumeResponse {
    pub filename: String,
    pub format: DocumentFormat,
    pub text: String,
}

/// POST /api/v1/resumes/parse
///
/// Accepts a multipart upload (first field carrying a filename, or the field
/// named `file`) and returns the extracted plain text. Extraction failures
/// come back as 422 with the `Error:`-marked message.
pub async fn handle_parse_resume(
    mut multipart: Multipart,
) -> Result<Json<ParseResumeResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            if field.name() == Some("file") {
                return Err(AppError::Validation(
                    "The 'file' field must carry a filename".to_string(),
                ));
            }
            continue;
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid file: {e}")))?;

        info!("Parsing uploaded resume {filename} ({} bytes)", bytes.len());

        let document = ResumeDocument::from_upload(&filename, bytes).map_err(log_rejection)?;
        let format = document.format;

        // PDF/DOCX parsing is CPU-bound; keep it off the async workers.
        let text = tokio::task::spawn_blocking(move || document.extract_text())
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Extraction task failed: {e}")))?
            .map_err(log_rejection)?;

        return Ok(Json(ParseResumeResponse {
            filename,
            format,
            text,
        }));
    }

    Err(AppError::Validation(
        "No file uploaded. Attach a PDF, DOCX, or TXT resume.".to_string(),
    ))
}

fn log_rejection(e: ExtractionError) -> ExtractionError {
    match &e {
        ExtractionError::UnsupportedFormat { filename } => {
            warn!("Rejected upload with unsupported format: {filename}")
        }
        ExtractionError::Parse { format, cause } => {
            warn!("Failed to parse uploaded {format} resume: {cause}")
        }
    }
    e
}
