use std::{env, time::Duration};

use secrecy::SecretString;

use crate::models::domain::SamplingConfig;

pub const DEFAULT_COMPLETION_API_BASE: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_FALLBACK_MODELS: &[&str] = &[
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.0-pro",
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-2.5-flash-lite-preview-09-2025",
];

#[derive(Clone, Debug)]
pub struct Config {
    pub web_server_host: String,
    pub web_server_port: u16,
    pub completion_api_key: Option<SecretString>,
    pub completion_api_base: String,
    pub preferred_model: String,
    pub fallback_models: Vec<String>,
    pub cache_ttl_secs: u64,
    pub branch_timeout_secs: u64,
    pub completion_workers: usize,
    pub completion_passes: u32,
    pub completion_pass_pause_ms: u64,
    pub sampling: SamplingConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            web_server_host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_server_port: parse_var("PORT", 5000),
            completion_api_key: env::var("GOOGLE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from),
            completion_api_base: env::var("COMPLETION_API_BASE")
                .unwrap_or_else(|_| DEFAULT_COMPLETION_API_BASE.to_string()),
            preferred_model: env::var("GEMINI_MODEL")
                .ok()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            fallback_models: env::var("FALLBACK_MODELS")
                .ok()
                .map(|list| split_model_list(&list))
                .filter(|list| !list.is_empty())
                .unwrap_or_else(|| {
                    DEFAULT_FALLBACK_MODELS
                        .iter()
                        .map(|m| m.to_string())
                        .collect()
                }),
            cache_ttl_secs: parse_var("QUIZ_CACHE_TTL_SECS", 120),
            branch_timeout_secs: parse_var("BRANCH_TIMEOUT_SECS", 25),
            completion_workers: parse_var("COMPLETION_WORKERS", 3),
            completion_passes: parse_var("COMPLETION_PASSES", 2),
            completion_pass_pause_ms: parse_var("COMPLETION_PASS_PAUSE_MS", 600),
            sampling: SamplingConfig::default(),
        }
    }

    /// Ordered, de-duplicated list of model ids to try, preferred model first.
    /// Legacy 1.5-generation ids are never tried.
    pub fn model_candidates(&self) -> Vec<String> {
        let mut models: Vec<String> = Vec::new();
        for model in std::iter::once(&self.preferred_model).chain(self.fallback_models.iter()) {
            let model = model.trim();
            if model.is_empty() || model.contains("1.5") {
                continue;
            }
            if !models.iter().any(|m| m == model) {
                models.push(model.to_string());
            }
        }
        models
    }

    pub fn branch_timeout(&self) -> Duration {
        Duration::from_secs(self.branch_timeout_secs)
    }

    pub fn pass_pause(&self) -> Duration {
        Duration::from_millis(self.completion_pass_pause_ms)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs as i64)
    }

    /// Check the numeric settings that would otherwise make the service unusable.
    /// A missing credential is not an error here; quiz requests answer 503 instead.
    pub fn validate(&self) -> Result<(), String> {
        if self.completion_workers == 0 {
            return Err("COMPLETION_WORKERS must be at least 1".to_string());
        }
        if self.completion_passes == 0 {
            return Err("COMPLETION_PASSES must be at least 1".to_string());
        }
        if self.branch_timeout_secs == 0 {
            return Err("BRANCH_TIMEOUT_SECS must be at least 1".to_string());
        }
        if self.model_candidates().is_empty() {
            return Err("no usable completion model configured".to_string());
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 5000,
            completion_api_key: Some(SecretString::from("test-key".to_string())),
            completion_api_base: "http://localhost:9/v1".to_string(),
            preferred_model: "model-a".to_string(),
            fallback_models: vec!["model-b".to_string()],
            cache_ttl_secs: 120,
            branch_timeout_secs: 5,
            completion_workers: 3,
            completion_passes: 2,
            completion_pass_pause_ms: 0,
            sampling: SamplingConfig::default(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn split_model_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
