//! SQL dialect selection.
//!
//! Two schema variants exist side by side: a denormalized single-table
//! layout queried with Oracle syntax, and a normalized multi-table layout
//! queried with PostgreSQL syntax. Each carries its own fallback catalog
//! and its own prompt constraints; they are not interchangeable.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    /// Denormalized `sales(id, product_name, sale_date, amount, region)`,
    /// `ROWNUM` row limiting.
    Oracle,
    /// Normalized `sales`/`products`/`customers` joined on surrogate keys,
    /// `LIMIT`/`EXTRACT`/`DATE_TRUNC`.
    Postgres,
}

impl SqlDialect {
    /// Whether the AI prompt must be grounded in the live database schema.
    /// The Oracle variant has a fixed, known table; the Postgres variant is
    /// introspected fresh per call.
    pub fn needs_schema_grounding(&self) -> bool {
        matches!(self, SqlDialect::Postgres)
    }

    /// Fixed schema description used in the prompt when no live schema is
    /// supplied (Oracle variant).
    pub fn fixed_schema_text(&self) -> &'static str {
        "The database has a table named 'sales' with columns: id, product_name, sale_date, amount, region."
    }

    /// Dialect-specific syntax constraints for the prompt.
    pub fn prompt_rules(&self) -> &'static str {
        match self {
            SqlDialect::Oracle => {
                "- Use Oracle SQL syntax compatible with older versions (avoid FETCH FIRST, use ROWNUM instead)\n\
                 - Return only the SQL query without any explanation\n\
                 - Do not include markdown formatting or backticks\n\
                 - Make sure the query is specific to the question asked\n\
                 - For limiting results, use: SELECT * FROM (SELECT ... ORDER BY ...) WHERE ROWNUM <= N\n\
                 - Use SUM() instead of SDN() for summation"
            }
            SqlDialect::Postgres => {
                "- Use PostgreSQL syntax: LIMIT for row limiting, EXTRACT/DATE_TRUNC for date parts\n\
                 - Use explicit JOINs on the surrogate keys shown in the schema\n\
                 - Use ILIKE for case-insensitive name matching\n\
                 - Return only the SQL query without any explanation\n\
                 - Do not include markdown formatting or backticks"
            }
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlDialect::Oracle => write!(f, "oracle"),
            SqlDialect::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "oracle" => Ok(SqlDialect::Oracle),
            "postgres" | "postgresql" => Ok(SqlDialect::Postgres),
            other => Err(format!("unknown dialect: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dialect_names() {
        assert_eq!("oracle".parse::<SqlDialect>().unwrap(), SqlDialect::Oracle);
        assert_eq!(
            "PostgreSQL".parse::<SqlDialect>().unwrap(),
            SqlDialect::Postgres
        );
        assert!("mysql".parse::<SqlDialect>().is_err());
    }

    #[test]
    fn only_postgres_needs_live_schema() {
        assert!(!SqlDialect::Oracle.needs_schema_grounding());
        assert!(SqlDialect::Postgres.needs_schema_grounding());
    }
}
