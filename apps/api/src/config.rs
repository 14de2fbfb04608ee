use anyhow::{Context, Result};

use crate::llm_client::ServiceConfig;

const DEFAULT_DB_PATH: &str = "data/elements.db";
const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8045/v1";
const DEFAULT_MODEL: &str = "gemini-3-pro-high";
const DEFAULT_MODELS: &[&str] = &[
    "gemini-3-pro-high",
    "gemini-3-flash",
    "claude-sonnet-4-5",
    "claude-sonnet-4-5-thinking",
    "claude-opus-4-5-thinking",
];

/// Application configuration loaded from environment variables.
/// Every variable has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub fragment_db_path: String,
    pub llm_api_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    /// Models offered to clients; always contains `llm_model`.
    pub llm_models: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let llm_model = env_or("LLM_MODEL", DEFAULT_MODEL);
        let llm_models = parse_model_list(std::env::var("LLM_MODELS").ok().as_deref(), &llm_model);

        Ok(Config {
            fragment_db_path: env_or("FRAGMENT_DB_PATH", DEFAULT_DB_PATH),
            llm_api_base_url: env_or("LLM_API_BASE_URL", DEFAULT_API_BASE_URL),
            llm_api_key: env_or("LLM_API_KEY", ""),
            llm_model,
            llm_models,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Completion-service settings, with per-request overrides applied.
    pub fn service(
        &self,
        base_url: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
    ) -> ServiceConfig {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        ServiceConfig {
            base_url: non_blank(base_url).unwrap_or_else(|| self.llm_api_base_url.clone()),
            api_key: non_blank(api_key).unwrap_or_else(|| self.llm_api_key.clone()),
            model: non_blank(model).unwrap_or_else(|| self.llm_model.clone()),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Comma-separated model list; falls back to the built-in list. The default
/// model is prepended when missing.
fn parse_model_list(raw: Option<&str>, default_model: &str) -> Vec<String> {
    let mut models: Vec<String> = match raw {
        Some(list) if !list.trim().is_empty() => list
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect(),
        _ => DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
    };
    if !models.iter().any(|m| m == default_model) {
        models.insert(0, default_model.to_string());
    }
    models
}
