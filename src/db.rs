//! PostgreSQL connectivity and live schema introspection.
//!
//! The core never executes generated SQL; this module only opens a pool,
//! probes for the sales table, and reads `information_schema.columns` to
//! ground the AI prompt in the real catalog.

use crate::error::Result;
use crate::schema::{ColumnInfo, SchemaDescription};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Duration;

pub type DbPool = PgPool;

/// Initialize the connection pool and verify it with a trivial query.
pub async fn init_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Whether the public `sales` table exists.
pub async fn sales_table_exists(pool: &PgPool) -> Result<bool> {
    let row = sqlx::query("SELECT to_regclass('public.sales')::text AS reg")
        .fetch_one(pool)
        .await?;
    let reg: Option<String> = row.try_get("reg")?;
    Ok(reg.is_some())
}

/// Fetch the live schema of all public tables, ordered by table name and
/// ordinal position. Called fresh per request; nothing is cached.
pub async fn fetch_schema(pool: &PgPool) -> Result<SchemaDescription> {
    let rows = sqlx::query(
        "SELECT table_name, column_name, data_type \
         FROM information_schema.columns \
         WHERE table_schema = 'public' \
         ORDER BY table_name, ordinal_position",
    )
    .fetch_all(pool)
    .await?;

    let mut schema = SchemaDescription::default();
    for row in rows {
        let table: String = row.try_get("table_name")?;
        let name: String = row.try_get("column_name")?;
        let data_type: String = row.try_get("data_type")?;
        schema.push_column(&table, ColumnInfo { name, data_type });
    }

    Ok(schema)
}
