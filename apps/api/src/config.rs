use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

/// Which wire protocol the model backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProvider {
    /// Anthropic Messages API.
    Anthropic,
    /// Any OpenAI-compatible `/chat/completions` endpoint.
    OpenAi,
}

impl ModelProvider {
    pub fn default_api_url(self) -> &'static str {
        match self {
            ModelProvider::Anthropic => "https://api.anthropic.com/v1/messages",
            ModelProvider::OpenAi => "https://api.openai.com/v1/chat/completions",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ModelProvider::Anthropic => "claude-sonnet-4-5",
            ModelProvider::OpenAi => "gpt-4o-mini",
        }
    }

    /// Provider-specific environment variable consulted when `MODEL_API_KEY` is unset.
    fn key_var(self) -> &'static str {
        match self {
            ModelProvider::Anthropic => "ANTHROPIC_API_KEY",
            ModelProvider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl FromStr for ModelProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(ModelProvider::Anthropic),
            "openai" => Ok(ModelProvider::OpenAi),
            other => Err(anyhow!(
                "MODEL_PROVIDER must be 'anthropic' or 'openai', got '{other}'"
            )),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if a value is present but malformed. A missing API key is
/// not fatal: the model backend is reported as unavailable instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub model_provider: ModelProvider,
    pub model_api_key: Option<String>,
    pub model_api_url: String,
    pub model_name: String,
    pub model_max_tokens: u32,
    pub model_timeout_secs: u64,
    pub generation_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_provider = match lookup("MODEL_PROVIDER") {
            Some(raw) => raw.parse()?,
            None => ModelProvider::Anthropic,
        };

        let model_api_key = lookup("MODEL_API_KEY")
            .or_else(|| lookup(model_provider.key_var()))
            .filter(|k| !k.trim().is_empty());

        Ok(Config {
            model_provider,
            model_api_key,
            model_api_url: lookup("MODEL_API_URL")
                .unwrap_or_else(|| model_provider.default_api_url().to_string()),
            model_name: lookup("MODEL_NAME")
                .unwrap_or_else(|| model_provider.default_model().to_string()),
            model_max_tokens: parse_or(&lookup, "MODEL_MAX_TOKENS", 4096)?,
            model_timeout_secs: parse_or(&lookup, "MODEL_TIMEOUT_SECS", 120)?,
            generation_timeout_secs: parse_or(&lookup, "GENERATION_TIMEOUT_SECS", 300)?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.model_provider, ModelProvider::Anthropic);
        assert!(config.model_api_key.is_none());
        assert_eq!(config.model_api_url, "https://api.anthropic.com/v1/messages");
        assert_eq!(config.model_timeout_secs, 120);
        assert_eq!(config.generation_timeout_secs, 300);
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_provider_specific_key_is_used_as_fallback() {
        let config = config_from(&[("MODEL_PROVIDER", "OpenAI"), ("OPENAI_API_KEY", "sk-test")])
            .unwrap();
        assert_eq!(config.model_provider, ModelProvider::OpenAi);
        assert_eq!(config.model_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model_name, "gpt-4o-mini");
    }

    #[test]
    fn test_generic_key_wins_over_provider_key() {
        let config = config_from(&[
            ("MODEL_API_KEY", "generic"),
            ("ANTHROPIC_API_KEY", "specific"),
        ])
        .unwrap();
        assert_eq!(config.model_api_key.as_deref(), Some("generic"));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = config_from(&[("ANTHROPIC_API_KEY", "   ")]).unwrap();
        assert!(config.model_api_key.is_none());
    }

    #[test]
    fn test_invalid_number_names_the_variable() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"), "got: {err}");
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let err = config_from(&[("MODEL_PROVIDER", "cohere")]).unwrap_err();
        assert!(err.to_string().contains("MODEL_PROVIDER"));
    }
}
