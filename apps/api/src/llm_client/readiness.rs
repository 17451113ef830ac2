//! Model readiness: the process-wide model backend handle.
//!
//! Created `Uninitialized`, filled once at startup, then shared read-only by
//! every request through `AppState`.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::llm_client::{LlmClient, ModelBackend};

#[derive(Clone, Default)]
pub enum Readiness {
    #[default]
    Uninitialized,
    Ready(Arc<dyn ModelBackend>),
    Failed(String),
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct BackendUnavailable(pub String);

/// Serializable readiness summary for `/health`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadinessStatus {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Clone, Default)]
pub struct ModelSlot {
    inner: Arc<RwLock<Readiness>>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn ready(backend: Arc<dyn ModelBackend>) -> Self {
        let slot = Self::new();
        slot.set_ready(backend);
        slot
    }

    /// Builds the HTTP backend from config and records the outcome.
    pub fn initialize(&self, config: &Config) {
        let Some(api_key) = config.model_api_key.clone() else {
            warn!("No model API key configured; generation is disabled");
            self.set_failed("Model is not ready: no API key configured.");
            return;
        };

        match LlmClient::from_config(config, api_key) {
            Ok(client) => {
                info!(
                    "LLM client initialized (provider: {:?}, model: {})",
                    config.model_provider, config.model_name
                );
                self.set_ready(Arc::new(client));
            }
            Err(e) => {
                warn!("LLM client failed to initialize: {e}");
                self.set_failed(format!("Model is not ready: {e}"));
            }
        }
    }

    pub fn set_ready(&self, backend: Arc<dyn ModelBackend>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Readiness::Ready(backend);
    }

    pub fn set_failed(&self, reason: impl Into<String>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) =
            Readiness::Failed(reason.into());
    }

    /// Returns the backend if ready; otherwise a displayable reason.
    pub fn backend(&self) -> Result<Arc<dyn ModelBackend>, BackendUnavailable> {
        match &*self.inner.read().unwrap_or_else(PoisonError::into_inner) {
            Readiness::Ready(backend) => Ok(Arc::clone(backend)),
            Readiness::Uninitialized => {
                Err(BackendUnavailable("Model is not ready.".to_string()))
            }
            Readiness::Failed(reason) => Err(BackendUnavailable(reason.clone())),
        }
    }

    pub fn status(&self) -> ReadinessStatus {
        match &*self.inner.read().unwrap_or_else(PoisonError::into_inner) {
            Readiness::Uninitialized => ReadinessStatus {
                state: "uninitialized",
                model: None,
                detail: None,
            },
            Readiness::Ready(backend) => ReadinessStatus {
                state: "ready",
                model: Some(backend.model_name().to_string()),
                detail: None,
            },
            Readiness::Failed(reason) => ReadinessStatus {
                state: "failed",
                model: None,
                detail: Some(reason.clone()),
            },
        }
    }
}
