//! Environment-backed settings for the query-generation core.
//!
//! The Gemini credential is optional: a missing key, an empty key, or the
//! placeholder value shipped in `.env.example` all mean "AI disabled" and
//! the generator runs on the fallback rule engine alone.

use crate::dialect::SqlDialect;

/// Sentinel left in place by the sample env file; treated as no key at all.
const PLACEHOLDER_API_KEY: &str = "your_gemini_api_key_here";

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct Settings {
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    /// Candidate model identifiers, tried in order until one yields usable SQL.
    pub model_candidates: Vec<String>,
    pub dialect: SqlDialect,
    pub database_url: Option<String>,
}

impl Settings {
    /// Load settings from the process environment (after `dotenv`).
    pub fn from_env() -> Self {
        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .and_then(normalize_api_key);

        let gemini_base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());

        let model_candidates = std::env::var("GEMINI_MODELS")
            .map(|v| {
                v.split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| default_model_candidates());

        let dialect = std::env::var("BI_DIALECT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(SqlDialect::Oracle);

        Self {
            gemini_api_key,
            gemini_base_url,
            model_candidates,
            dialect,
            database_url: postgres_url_from_env(),
        }
    }

    /// AI path is usable only when a real (non-placeholder) key is present.
    pub fn ai_enabled(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

pub fn default_model_candidates() -> Vec<String> {
    vec!["gemini-pro".to_string(), "models/gemini-pro".to_string()]
}

fn normalize_api_key(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == PLACEHOLDER_API_KEY {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Assemble a Postgres URL from `DATABASE_URL` or the individual
/// `POSTGRES_*` variables. Returns `None` when the pieces are incomplete;
/// the caller decides whether that is fatal (it is not for the Oracle
/// dialect, which never introspects).
fn postgres_url_from_env() -> Option<String> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            return Some(url);
        }
    }

    let user = std::env::var("POSTGRES_USER").ok()?;
    let password = std::env::var("POSTGRES_PASSWORD").ok()?;
    let host = std::env::var("POSTGRES_HOST").ok()?;
    let port = std::env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
    let db = std::env::var("POSTGRES_DB").ok()?;

    Some(format!("postgres://{user}:{password}@{host}:{port}/{db}"))
}
