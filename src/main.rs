use anyhow::Result;
use clap::Parser;
use convobi::config::Settings;
use convobi::db;
use convobi::generator::{self, QueryGenerator, SAMPLE_QUESTIONS};
use convobi::SqlDialect;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "convobi")]
#[command(about = "Conversational BI assistant: plain-English questions about sales data, answered in SQL")]
struct Args {
    /// The question in natural language
    query: Option<String>,

    /// SQL dialect / schema variant: oracle (denormalized) or postgres (normalized)
    #[arg(short, long)]
    dialect: Option<SqlDialect>,

    /// Gemini API key (or set GEMINI_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// List sample questions and exit
    #[arg(long)]
    samples: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    if args.samples {
        println!("Try asking something like:");
        for q in SAMPLE_QUESTIONS {
            println!("  - {q}");
        }
        return Ok(());
    }

    let Some(query) = args.query else {
        anyhow::bail!("no question given (use --samples for examples)");
    };

    let mut settings = Settings::from_env();
    if let Some(key) = args.api_key {
        settings.gemini_api_key = Some(key);
    }
    if let Some(dialect) = args.dialect {
        settings.dialect = dialect;
    }

    info!(dialect = %settings.dialect, ai = settings.ai_enabled(), "convobi starting");

    let mut query_generator = QueryGenerator::from_settings(&settings);

    // Schema-grounded dialect: attach a pool so the AI prompt can carry the
    // live catalog. A missing or broken connection is not fatal, the
    // fallback rule engine still serves.
    if settings.dialect.needs_schema_grounding() {
        match &settings.database_url {
            Some(url) => match db::init_pool(url).await {
                Ok(pool) => {
                    match db::sales_table_exists(&pool).await {
                        Ok(true) => {}
                        Ok(false) => warn!("sales table not found in the database"),
                        Err(e) => warn!(error = %e, "could not probe for sales table"),
                    }
                    query_generator = query_generator.with_pool(pool);
                }
                Err(e) => warn!(error = %e, "database connection failed, schema grounding disabled"),
            },
            None => warn!("no database configured, schema grounding disabled"),
        }
    }

    let sql = query_generator.generate_sql_query(&query).await;
    println!("{sql}");

    if generator::is_generic_fallback(&sql) {
        warn!("generic fallback query in use; the AI query generator may be unavailable or unconfigured");
    }

    Ok(())
}
