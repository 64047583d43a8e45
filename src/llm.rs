//! AI translator: Gemini-backed natural language to SQL.
//!
//! A single synchronous-per-request call (no streaming, no backoff). The
//! candidate model identifiers are tried in order; the first response that
//! still looks like SQL after cleanup wins. Every failure path is
//! recoverable — the orchestrator turns any error from here into a
//! fallback-engine call.

use crate::dialect::SqlDialect;
use crate::error::{BiError, Result};
use crate::schema::SchemaDescription;
use tracing::{debug, warn};

pub struct GeminiClient {
    api_key: String,
    base_url: String,
    model_candidates: Vec<String>,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, model_candidates: Vec<String>) -> Self {
        Self {
            api_key,
            base_url,
            model_candidates,
            http: reqwest::Client::new(),
        }
    }

    /// Translate a question into SQL for the given dialect. `schema` is the
    /// live catalog dump for schema-grounded dialects; `None` falls back to
    /// the dialect's fixed schema text.
    pub async fn generate_sql(
        &self,
        question: &str,
        dialect: SqlDialect,
        schema: Option<&SchemaDescription>,
    ) -> Result<String> {
        let prompt = build_prompt(question, dialect, schema);
        debug!(dialect = %dialect, "built SQL generation prompt");

        for model in &self.model_candidates {
            match self.call_model(model, &prompt).await {
                Ok(raw) => {
                    let sql = fix_common_mistakes(&strip_code_fences(&raw));
                    if looks_like_sql(&sql) {
                        return Ok(sql);
                    }
                    warn!(model = %model, "model response did not look like SQL, trying next candidate");
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "model invocation failed, trying next candidate");
                }
            }
        }

        Err(BiError::Llm(
            "no model candidate produced usable SQL".to_string(),
        ))
    }

    async fn call_model(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url,
            model_resource_path(model),
            self.api_key
        );

        let body = serde_json::json!({
            "contents": [
                {"parts": [{"text": prompt}]}
            ]
        });

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| BiError::Llm(format!("Gemini API call failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BiError::Llm(format!(
                "Gemini API error ({status}): {error_text}"
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BiError::Llm(format!("Failed to parse Gemini response: {e}")))?;

        if let Some(error) = response_json.get("error") {
            return Err(BiError::Llm(format!("Gemini API error: {error}")));
        }

        let text = response_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                BiError::Llm(format!(
                    "No text in Gemini response: {}",
                    serde_json::to_string(&response_json)
                        .unwrap_or_else(|_| "unserializable".to_string())
                ))
            })?;

        if text.trim().is_empty() {
            return Err(BiError::Llm("Empty text in Gemini response".to_string()));
        }

        Ok(text.to_string())
    }
}

/// Candidate identifiers may already carry the `models/` prefix.
fn model_resource_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

fn build_prompt(
    question: &str,
    dialect: SqlDialect,
    schema: Option<&SchemaDescription>,
) -> String {
    let dialect_label = match dialect {
        SqlDialect::Oracle => "Oracle",
        SqlDialect::Postgres => "PostgreSQL",
    };

    let schema_text = match schema {
        Some(s) if !s.is_empty() => s.to_prompt_text(),
        _ => dialect.fixed_schema_text().to_string(),
    };

    format!(
        "You are an expert data analyst and SQL generator. Convert the following natural language query into {dialect_label} SQL.\n\
         {schema_text}\n\
         \n\
         Important:\n\
         {rules}\n\
         \n\
         Natural language query: {question}",
        rules = dialect.prompt_rules(),
    )
}

/// Strip a leading fenced-code marker (optionally tagged `sql`) and a
/// trailing one, then trim. Idempotent on already-clean input.
pub fn strip_code_fences(raw: &str) -> String {
    let mut s = raw.trim();

    if let Some(rest) = s.strip_prefix("```sql") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }

    s.trim().to_string()
}

/// Rewrite known literal-token mistakes the model produces.
pub fn fix_common_mistakes(sql: &str) -> String {
    sql.replace("SDN(", "SUM(")
}

/// Superficial sanity check; deliberately not a SQL parser.
pub fn looks_like_sql(sql: &str) -> bool {
    let lower = sql.to_lowercase();
    lower.contains("select") && lower.contains("from")
}
