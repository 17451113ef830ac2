use crate::config::Config;
use crate::llm_client::ModelSlot;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide model backend handle with its readiness state.
    pub model: ModelSlot,
    pub config: Config,
}
