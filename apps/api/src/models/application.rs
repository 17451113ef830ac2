use serde::{Deserialize, Serialize};

/// Inbound generation request. `user_notes` may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub resume_text: String,
    pub job_description: String,
    #[serde(default)]
    pub user_notes: String,
}

/// Combined output of one generation run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub tailored_resume: String,
    pub cover_letter: String,
    /// 1 – 100, or the neutral default when the scoring output was unreadable.
    pub score: u32,
    pub analysis: String,
}
