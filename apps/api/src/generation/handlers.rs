//! Axum route handler for the Generation API.

use std::time::Duration;

use axum::{extract::State, Json};
use tracing::warn;

use crate::errors::AppError;
use crate::generation::orchestrator::generate_application;
use crate::models::application::{GenerationRequest, GenerationResult};
use crate::state::AppState;

/// POST /api/v1/generate (also served at /generate)
///
/// Full pipeline: rewrite → cover letter → score. The whole run is bounded by
/// `GENERATION_TIMEOUT_SECS`; on expiry the run is dropped and nothing partial
/// is returned.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerationResult>, AppError> {
    if request.resume_text.trim().is_empty() {
        return Err(AppError::Validation(
            "resume_text cannot be empty. Upload or paste your resume first.".to_string(),
        ));
    }
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "Please paste the job description to proceed.".to_string(),
        ));
    }

    let backend = state.model.backend()?;
    let secs = state.config.generation_timeout_secs;

    let result = tokio::time::timeout(
        Duration::from_secs(secs),
        generate_application(backend.as_ref(), &request),
    )
    .await
    .map_err(|_| AppError::GenerationTimeout { secs })?
    .map_err(|e| {
        warn!("Generation aborted during {} stage", e.stage());
        AppError::Generation(e)
    })?;

    Ok(Json(result))
}
