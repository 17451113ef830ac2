//! Generation Orchestrator: runs the three model stages in order.
//!
//! Flow: rewrite(resume, jd) → cover_letter(tailored, jd, notes) →
//!       scoring(tailored, jd) → parse score/analysis → GenerationResult.
//!
//! Each stage consumes the previous stage's output, so nothing runs in
//! parallel. Any stage failure aborts the run: there is no partial result and
//! no retry. Dropping the future (timeout, client gone) discards whatever the
//! earlier stages produced.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::generation::prompts::{render_cover_letter, TemplateError, RESUME_REWRITE, SCORING};
use crate::generation::score_parser::parse_score_response;
use crate::llm_client::{LlmError, ModelBackend};
use crate::models::application::{GenerationRequest, GenerationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Rewrite,
    CoverLetter,
    Scoring,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Rewrite => "resume rewrite",
            Stage::CoverLetter => "cover letter",
            Stage::Scoring => "scoring",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{stage} stage could not build its prompt: {source}")]
    Template {
        stage: Stage,
        #[source]
        source: TemplateError,
    },

    #[error("{stage} stage failed: {source}")]
    Model {
        stage: Stage,
        #[source]
        source: LlmError,
    },
}

impl GenerationError {
    pub fn stage(&self) -> Stage {
        match self {
            GenerationError::Template { stage, .. } | GenerationError::Model { stage, .. } => {
                *stage
            }
        }
    }
}

/// Runs rewrite → cover letter → scoring against `backend` and assembles the result.
pub async fn generate_application(
    backend: &dyn ModelBackend,
    request: &GenerationRequest,
) -> Result<GenerationResult, GenerationError> {
    let run_id = Uuid::new_v4();
    info!(
        "Generation {run_id} started (model: {}, resume_chars={}, jd_chars={})",
        backend.model_name(),
        request.resume_text.len(),
        request.job_description.len()
    );

    // Stage 1: tailor the resume
    let prompt = RESUME_REWRITE
        .render(&[
            ("resume_text", request.resume_text.as_str()),
            ("job_description", request.job_description.as_str()),
        ])
        .map_err(|source| GenerationError::Template {
            stage: Stage::Rewrite,
            source,
        })?;
    let tailored_resume = run_stage(backend, run_id, Stage::Rewrite, &prompt).await?;

    // Stage 2: cover letter from the tailored resume
    let prompt = render_cover_letter(
        &tailored_resume,
        &request.job_description,
        &request.user_notes,
    )
    .map_err(|source| GenerationError::Template {
        stage: Stage::CoverLetter,
        source,
    })?;
    let cover_letter = run_stage(backend, run_id, Stage::CoverLetter, &prompt).await?;

    // Stage 3: score the tailored resume, not the original
    let prompt = SCORING
        .render(&[
            ("resume_text", tailored_resume.as_str()),
            ("job_description", request.job_description.as_str()),
        ])
        .map_err(|source| GenerationError::Template {
            stage: Stage::Scoring,
            source,
        })?;
    let raw_score = run_stage(backend, run_id, Stage::Scoring, &prompt).await?;
    let parsed = parse_score_response(&raw_score);

    info!("Generation {run_id} finished: score {}/100", parsed.score);

    Ok(GenerationResult {
        tailored_resume,
        cover_letter,
        score: parsed.score,
        analysis: parsed.analysis,
    })
}

async fn run_stage(
    backend: &dyn ModelBackend,
    run_id: Uuid,
    stage: Stage,
    prompt: &str,
) -> Result<String, GenerationError> {
    debug!("Generation {run_id}: {stage} prompt is {} chars", prompt.len());

    let output = backend
        .complete(prompt)
        .await
        .map_err(|source| GenerationError::Model { stage, source })?;

    info!("Generation {run_id}: {stage} stage complete ({} chars)", output.len());
    Ok(output)
}
