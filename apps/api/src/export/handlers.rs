//! Axum route handler for PDF export.

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::export::render_pdf;

const DEFAULT_TITLE: &str = "Document";

#[derive(Debug, Deserialize)]
pub struct ExportPdfRequest {
    pub text: String,
    pub title: Option<String>,
}

/// POST /api/v1/export/pdf
///
/// Returns the text as an attachment, e.g. `Optimized_Resume.pdf` for the
/// title "Optimized Resume".
pub async fn handle_export_pdf(
    Json(request): Json<ExportPdfRequest>,
) -> Result<Response, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let title = request
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let filename = format!("{}.pdf", attachment_stem(&title));

    let text = request.text;
    let pdf_title = title.clone();
    let bytes = tokio::task::spawn_blocking(move || render_pdf(&text, &pdf_title))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF task failed: {e}")))??;

    info!("Exported '{title}' as {filename} ({} bytes)", bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// File-name-safe stem: ASCII alphanumerics, `-` and `_`; whitespace runs become `_`.
fn attachment_stem(title: &str) -> String {
    let stem = title
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if stem.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        stem
    }
}
