//! Query generator: the single public entry point.
//!
//! Decides once, at construction, whether the AI path is available; per
//! call it either attempts the AI translator (recovering from any failure
//! by delegating to the fallback rule engine) or goes straight to the
//! fallback. `generate_sql_query` is infallible by contract: it always
//! returns some syntactically plausible SQL string.

use crate::config::Settings;
use crate::db::{self, DbPool};
use crate::dialect::SqlDialect;
use crate::error::{BiError, Result};
use crate::fallback::{self, RuleCatalog};
use crate::llm::GeminiClient;
use tracing::{info, warn};

/// Starter questions surfaced by the front end.
pub const SAMPLE_QUESTIONS: &[&str] = &[
    "Show me last 5 sales records",
    "Which product has the highest total sales?",
    "Compare sales between North and South regions",
    "What were the total sales in February 2023?",
    "Show sales by product and region",
    "What is the average sale amount by product?",
];

pub struct QueryGenerator {
    dialect: SqlDialect,
    catalog: Box<dyn RuleCatalog>,
    translator: Option<GeminiClient>,
    pool: Option<DbPool>,
}

impl QueryGenerator {
    /// Build from settings. The AI capability flag is captured here and
    /// never re-read: a credential added mid-session without
    /// reconstruction keeps the path selected now.
    pub fn from_settings(settings: &Settings) -> Self {
        let translator = settings.gemini_api_key.as_ref().map(|key| {
            GeminiClient::new(
                key.clone(),
                settings.gemini_base_url.clone(),
                settings.model_candidates.clone(),
            )
        });

        if translator.is_some() {
            info!(dialect = %settings.dialect, "AI query generation enabled");
        } else {
            info!(dialect = %settings.dialect, "no usable API key, fallback rule engine only");
        }

        Self {
            dialect: settings.dialect,
            catalog: fallback::catalog_for(settings.dialect),
            translator,
            pool: None,
        }
    }

    /// Fallback-only generator for the given dialect.
    pub fn fallback_only(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            catalog: fallback::catalog_for(dialect),
            translator: None,
            pool: None,
        }
    }

    /// Attach a database pool for live schema grounding (Postgres dialect).
    pub fn with_pool(mut self, pool: DbPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Translate a natural-language question into SQL. Never fails: any
    /// AI-path error is recovered by the fallback rule engine.
    pub async fn generate_sql_query(&self, question: &str) -> String {
        match &self.translator {
            Some(client) => match self.try_ai(client, question).await {
                Ok(sql) => sql,
                Err(e) => {
                    warn!(error = %e, "AI translation failed, using fallback rule engine");
                    self.catalog.build_query(question)
                }
            },
            None => self.catalog.build_query(question),
        }
    }

    async fn try_ai(&self, client: &GeminiClient, question: &str) -> Result<String> {
        // Schema-grounded dialects re-fetch the catalog on every call; no
        // staleness is tolerated and nothing is cached.
        let schema = if self.dialect.needs_schema_grounding() {
            let pool = self.pool.as_ref().ok_or_else(|| {
                BiError::Schema("schema grounding required but no database pool attached".to_string())
            })?;
            Some(db::fetch_schema(pool).await?)
        } else {
            None
        };

        client
            .generate_sql(question, self.dialect, schema.as_ref())
            .await
    }
}

/// Heuristic used by the front end to show a "fallback in use" notice:
/// matches the unconditional default query shapes of both catalogs.
pub fn is_generic_fallback(sql: &str) -> bool {
    sql.contains("ROWNUM <= 5")
        || sql.contains("ROWNUM <= 10")
        || sql.trim() == "SELECT * FROM sales LIMIT 10"
}
