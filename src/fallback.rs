//! Deterministic fallback rule engine.
//!
//! An ordered decision list of keyword predicates mapped to SQL templates.
//! Evaluation lower-cases the question, walks the rules in declaration
//! order, and returns the first match; if nothing matches, a dialect
//! default "most recent rows" query is returned. The engine is total and
//! pure: it never fails and has no state beyond the read-only catalog.
//!
//! Two catalogs exist, one per schema variant. Their rule orders differ
//! and are each preserved as-is; order is behavior here.

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

/// A fallback catalog: deterministic question-to-SQL translation.
pub trait RuleCatalog: Send + Sync {
    /// Total function; always returns a syntactically plausible SQL string.
    fn build_query(&self, question: &str) -> String;

    /// The unconditional default returned when no rule matches.
    fn default_query(&self) -> &str;
}

/// Keyword predicate over the lower-cased question.
#[derive(Debug, Clone)]
pub enum Predicate {
    Contains(&'static str),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    fn matches(&self, q: &str) -> bool {
        match self {
            Predicate::Contains(needle) => q.contains(needle),
            Predicate::All(preds) => preds.iter().all(|p| p.matches(q)),
            Predicate::Any(preds) => preds.iter().any(|p| p.matches(q)),
        }
    }
}

fn has(word: &'static str) -> Predicate {
    Predicate::Contains(word)
}

fn all_of(preds: Vec<Predicate>) -> Predicate {
    Predicate::All(preds)
}

fn any_of(preds: Vec<Predicate>) -> Predicate {
    Predicate::Any(preds)
}

/// Template body: either fixed SQL or SQL with one free-text slot filled
/// from the question.
enum Template {
    Fixed(&'static str),
    Slot {
        keyword: &'static str,
        render: fn(entity: &str) -> String,
    },
}

impl Template {
    fn render(&self, question_lower: &str) -> String {
        match self {
            Template::Fixed(sql) => (*sql).to_string(),
            Template::Slot { keyword, render } => {
                let entity = extract_after_keyword(question_lower, keyword);
                if entity.is_empty() {
                    // Renders a match-everything pattern; kept from the
                    // original behavior but worth seeing in the logs.
                    warn!(keyword = %keyword, "empty entity after keyword; pattern matches all rows");
                }
                render(&escape_literal_fragment(&entity))
            }
        }
    }
}

struct Rule {
    predicate: Predicate,
    template: Template,
}

impl Rule {
    fn fixed(predicate: Predicate, sql: &'static str) -> Self {
        Self {
            predicate,
            template: Template::Fixed(sql),
        }
    }

    fn slot(predicate: Predicate, keyword: &'static str, render: fn(&str) -> String) -> Self {
        Self {
            predicate,
            template: Template::Slot { keyword, render },
        }
    }
}

/// Text after the last occurrence of `keyword`, trimmed of whitespace and
/// trailing question marks. Empty when the keyword is absent or terminal.
fn extract_after_keyword(question_lower: &str, keyword: &str) -> String {
    static TRAILING: OnceLock<Regex> = OnceLock::new();
    let trailing = TRAILING.get_or_init(|| Regex::new(r"[\s?]+$").unwrap());

    match question_lower.rfind(keyword) {
        Some(idx) => {
            let tail = &question_lower[idx + keyword.len()..];
            trailing.replace(tail.trim_start(), "").to_string()
        }
        None => String::new(),
    }
}

/// Conservative escape for free text headed into a string literal. Output
/// is still concatenated (the public contract is a plain SQL string), so
/// quotes are doubled and statement/comment introducers removed.
fn escape_literal_fragment(raw: &str) -> String {
    raw.replace('\'', "''")
        .replace(';', "")
        .replace("--", "")
        .replace("/*", "")
        .replace("*/", "")
        .trim()
        .to_string()
}

fn evaluate(rules: &[Rule], default_sql: &str, question: &str) -> String {
    let q = question.to_lowercase();
    for rule in rules {
        if rule.predicate.matches(&q) {
            return rule.template.render(&q);
        }
    }
    default_sql.to_string()
}

// ---------------------------------------------------------------------------
// Oracle catalog: denormalized sales(id, product_name, sale_date, amount,
// region); ROWNUM row limiting, EXTRACT date parts.
// ---------------------------------------------------------------------------

const ORACLE_DEFAULT: &str =
    "SELECT * FROM (SELECT * FROM sales ORDER BY id DESC) WHERE ROWNUM <= 10";

pub struct OracleCatalog {
    rules: Vec<Rule>,
}

impl OracleCatalog {
    pub fn new() -> Self {
        let rules = vec![
            Rule::fixed(
                any_of(vec![has("last 5"), has("recent"), has("show me"), has("display")]),
                "SELECT * FROM (SELECT * FROM sales ORDER BY sale_date DESC) WHERE ROWNUM <= 5",
            ),
            Rule::fixed(
                all_of(vec![has("total sales"), has("product")]),
                "SELECT product_name, SUM(amount) as total_sales FROM sales GROUP BY product_name ORDER BY total_sales DESC",
            ),
            Rule::fixed(
                all_of(vec![has("average"), has("product")]),
                "SELECT product_name, AVG(amount) as average_sale FROM sales GROUP BY product_name ORDER BY average_sale DESC",
            ),
            // Checked ahead of the generic region rule so that a question
            // naming both regions gets the IN-filtered comparison.
            Rule::fixed(
                all_of(vec![has("north"), has("south")]),
                "SELECT region, SUM(amount) as total_sales FROM sales WHERE region IN ('North', 'South') GROUP BY region ORDER BY total_sales DESC",
            ),
            Rule::fixed(
                all_of(vec![has("region"), any_of(vec![has("compare"), has("by region")])]),
                "SELECT region, SUM(amount) as total_sales FROM sales GROUP BY region ORDER BY total_sales DESC",
            ),
            Rule::fixed(
                all_of(vec![has("product"), has("region")]),
                "SELECT product_name, region, SUM(amount) as total_sales FROM sales GROUP BY product_name, region ORDER BY product_name, region",
            ),
            Rule::fixed(
                any_of(vec![has("february"), has("2"), has("second month")]),
                "SELECT product_name, SUM(amount) as total_sales FROM sales WHERE EXTRACT(MONTH FROM sale_date) = 2 AND EXTRACT(YEAR FROM sale_date) = 2023 GROUP BY product_name",
            ),
            Rule::fixed(
                any_of(vec![has("trend"), has("over time"), has("by date")]),
                "SELECT sale_date, SUM(amount) as daily_sales FROM sales GROUP BY sale_date ORDER BY sale_date",
            ),
            Rule::fixed(
                has("product x"),
                "SELECT * FROM sales WHERE product_name = 'Product X' ORDER BY sale_date",
            ),
            Rule::fixed(
                has("product y"),
                "SELECT * FROM sales WHERE product_name = 'Product Y' ORDER BY sale_date",
            ),
            Rule::fixed(
                has("north"),
                "SELECT * FROM sales WHERE region = 'North' ORDER BY sale_date",
            ),
            Rule::fixed(
                has("south"),
                "SELECT * FROM sales WHERE region = 'South' ORDER BY sale_date",
            ),
            Rule::fixed(
                all_of(vec![has("amount"), has("average")]),
                "SELECT product_name, AVG(amount) as average_amount FROM sales GROUP BY product_name ORDER BY average_amount DESC",
            ),
            Rule::fixed(
                all_of(vec![has("amount"), has("sum")]),
                "SELECT product_name, SUM(amount) as total_amount FROM sales GROUP BY product_name ORDER BY total_amount DESC",
            ),
        ];
        Self { rules }
    }
}

impl Default for OracleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleCatalog for OracleCatalog {
    fn build_query(&self, question: &str) -> String {
        evaluate(&self.rules, ORACLE_DEFAULT, question)
    }

    fn default_query(&self) -> &str {
        ORACLE_DEFAULT
    }
}

// ---------------------------------------------------------------------------
// Postgres catalog: normalized sales/products/customers joined on surrogate
// keys; LIMIT, EXTRACT, DATE_TRUNC, INTERVAL.
// ---------------------------------------------------------------------------

const POSTGRES_DEFAULT: &str = "SELECT * FROM sales LIMIT 10";

fn monthly_trend_for_product(product: &str) -> String {
    format!(
        "SELECT DATE_TRUNC('month', s.sale_date) as month, SUM(s.amount) as total_sales \
         FROM sales s \
         JOIN products p ON s.product_id = p.product_id \
         WHERE p.product_name ILIKE '%{product}%' \
         GROUP BY month \
         ORDER BY month"
    )
}

fn northern_customers_of_product(product: &str) -> String {
    format!(
        "SELECT DISTINCT c.customer_name \
         FROM sales s \
         JOIN products p ON s.product_id = p.product_id \
         JOIN customers c ON s.customer_id = c.customer_id \
         WHERE c.region='North' AND p.product_name ILIKE '%{product}%'"
    )
}

pub struct PostgresCatalog {
    rules: Vec<Rule>,
}

impl PostgresCatalog {
    pub fn new() -> Self {
        let rules = vec![
            // Sales analysis
            Rule::fixed(
                all_of(vec![has("total sales"), has("last 6 months")]),
                "SELECT p.product_name, SUM(s.amount) as total_sales FROM sales s JOIN products p ON s.product_id = p.product_id WHERE s.sale_date >= CURRENT_DATE - INTERVAL '6 months' GROUP BY p.product_name ORDER BY total_sales DESC",
            ),
            Rule::fixed(
                all_of(vec![has("highest sales"), has("2024")]),
                "SELECT c.region, SUM(s.amount) as total_sales FROM sales s JOIN customers c ON s.customer_id = c.customer_id WHERE EXTRACT(YEAR FROM s.sale_date) = 2024 GROUP BY c.region ORDER BY total_sales DESC LIMIT 1",
            ),
            Rule::slot(
                all_of(vec![has("monthly"), has("trend"), has("product")]),
                "product",
                monthly_trend_for_product,
            ),
            Rule::fixed(
                all_of(vec![has("compare"), has("product"), has("region")]),
                "SELECT p.product_name, c.region, SUM(s.amount) as total_sales FROM sales s JOIN products p ON s.product_id = p.product_id JOIN customers c ON s.customer_id = c.customer_id GROUP BY p.product_name, c.region ORDER BY p.product_name, c.region",
            ),
            // Customer insights
            Rule::fixed(
                has("top 10 customers"),
                "SELECT c.customer_name, SUM(s.amount) as total_spent FROM sales s JOIN customers c ON s.customer_id = c.customer_id GROUP BY c.customer_name ORDER BY total_spent DESC LIMIT 10",
            ),
            Rule::fixed(
                any_of(vec![has("purchased more than"), has("spending")]),
                "SELECT c.customer_name, SUM(s.amount) as total_spent FROM sales s JOIN customers c ON s.customer_id = c.customer_id GROUP BY c.customer_name HAVING SUM(s.amount) > 5000 ORDER BY total_spent DESC",
            ),
            Rule::fixed(
                all_of(vec![has("unique customers"), has("february 2025")]),
                "SELECT COUNT(DISTINCT customer_id) as unique_customers FROM sales WHERE EXTRACT(MONTH FROM sale_date)=2 AND EXTRACT(YEAR FROM sale_date)=2025",
            ),
            // Product insights
            Rule::fixed(
                all_of(vec![has("average sales"), has("category")]),
                "SELECT p.category, AVG(s.amount) as avg_sales FROM sales s JOIN products p ON s.product_id = p.product_id GROUP BY p.category ORDER BY avg_sales DESC",
            ),
            Rule::fixed(
                all_of(vec![has("lowest sales"), has("2023")]),
                "SELECT p.product_name, SUM(s.amount) as total_sales FROM sales s JOIN products p ON s.product_id = p.product_id WHERE EXTRACT(YEAR FROM s.sale_date)=2023 GROUP BY p.product_name ORDER BY total_sales ASC LIMIT 1",
            ),
            Rule::fixed(
                all_of(vec![has("distribution"), has("categories")]),
                "SELECT p.category, SUM(s.amount) as total_sales FROM sales s JOIN products p ON s.product_id = p.product_id GROUP BY p.category",
            ),
            // Time-based trends
            Rule::fixed(
                all_of(vec![has("daily sales"), has("last 30 days")]),
                "SELECT s.sale_date, SUM(s.amount) as daily_sales FROM sales s WHERE s.sale_date >= CURRENT_DATE - INTERVAL '30 days' GROUP BY s.sale_date ORDER BY s.sale_date",
            ),
            Rule::fixed(
                all_of(vec![has("quarterly"), any_of(vec![has("2023"), has("2024")])]),
                "SELECT EXTRACT(YEAR FROM s.sale_date) as year, EXTRACT(QUARTER FROM s.sale_date) as quarter, SUM(s.amount) as total_sales FROM sales s WHERE EXTRACT(YEAR FROM s.sale_date) IN (2023,2024) GROUP BY year, quarter ORDER BY year, quarter",
            ),
            Rule::fixed(
                any_of(vec![has("highest sale amount"), has("single transaction")]),
                "SELECT MAX(amount) as highest_sale FROM sales",
            ),
            // Mixed insights
            Rule::fixed(
                all_of(vec![has("sales by product and region"), has("2025")]),
                "SELECT p.product_name, c.region, SUM(s.amount) as total_sales FROM sales s JOIN products p ON s.product_id = p.product_id JOIN customers c ON s.customer_id = c.customer_id WHERE EXTRACT(YEAR FROM s.sale_date)=2025 GROUP BY p.product_name, c.region",
            ),
            Rule::slot(
                all_of(vec![has("customers"), has("north"), has("product")]),
                "product",
                northern_customers_of_product,
            ),
            Rule::fixed(
                all_of(vec![has("top 5 products"), has("south")]),
                "SELECT p.product_name, SUM(s.amount) as total_sales FROM sales s JOIN products p ON s.product_id = p.product_id JOIN customers c ON s.customer_id = c.customer_id WHERE c.region='South' GROUP BY p.product_name ORDER BY total_sales DESC LIMIT 5",
            ),
        ];
        Self { rules }
    }
}

impl Default for PostgresCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleCatalog for PostgresCatalog {
    fn build_query(&self, question: &str) -> String {
        evaluate(&self.rules, POSTGRES_DEFAULT, question)
    }

    fn default_query(&self) -> &str {
        POSTGRES_DEFAULT
    }
}

/// Catalog for a dialect, boxed for shared read-only use.
pub fn catalog_for(dialect: crate::dialect::SqlDialect) -> Box<dyn RuleCatalog> {
    match dialect {
        crate::dialect::SqlDialect::Oracle => Box::new(OracleCatalog::new()),
        crate::dialect::SqlDialect::Postgres => Box::new(PostgresCatalog::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_five_records_uses_rownum() {
        let catalog = OracleCatalog::new();
        let sql = catalog.build_query("Show me last 5 sales records");
        assert!(sql.contains("ROWNUM <= 5"));
        assert!(sql.contains("ORDER BY sale_date DESC"));
    }

    #[test]
    fn north_south_comparison_filters_both_regions() {
        let catalog = OracleCatalog::new();
        let sql = catalog.build_query("Compare sales between North and South regions");
        assert!(sql.contains("GROUP BY region"));
        assert!(sql.contains("'North'"));
        assert!(sql.contains("'South'"));
    }

    #[test]
    fn average_by_product_aggregates_with_avg() {
        let catalog = OracleCatalog::new();
        let sql = catalog.build_query("What is the average sale amount by product?");
        assert!(sql.contains("AVG(amount)"));
        assert!(sql.contains("GROUP BY product_name"));
        assert!(sql.contains("DESC"));
    }

    #[test]
    fn empty_input_returns_default() {
        let oracle = OracleCatalog::new();
        assert_eq!(oracle.build_query(""), ORACLE_DEFAULT);
        assert_eq!(oracle.build_query("   \t  "), ORACLE_DEFAULT);

        let pg = PostgresCatalog::new();
        assert_eq!(pg.build_query(""), POSTGRES_DEFAULT);
    }

    #[test]
    fn engine_is_pure() {
        let catalog = OracleCatalog::new();
        let a = catalog.build_query("total sales by product");
        let b = catalog.build_query("total sales by product");
        assert_eq!(a, b);
    }

    #[test]
    fn first_matching_rule_wins() {
        // "show me total sales by product" matches both the recency rule
        // (rule 1, "show me") and the total-sales rule (rule 2). Rule 1 is
        // declared first, so it fires.
        let catalog = OracleCatalog::new();
        let sql = catalog.build_query("show me total sales by product");
        assert!(sql.contains("ROWNUM <= 5"));
        assert!(!sql.contains("GROUP BY"));
    }

    #[test]
    fn catalog_output_always_selects() {
        let oracle = OracleCatalog::new();
        let pg = PostgresCatalog::new();
        for q in [
            "",
            "gibberish",
            "total sales by product",
            "quarterly results 2024",
            "who are my top 10 customers",
        ] {
            for sql in [oracle.build_query(q), pg.build_query(q)] {
                let lower = sql.to_lowercase();
                assert!(lower.contains("select"), "no select in: {sql}");
                assert!(lower.contains("from"), "no from in: {sql}");
            }
        }
    }

    #[test]
    fn extracts_entity_after_last_keyword() {
        assert_eq!(
            extract_after_keyword("monthly trend for product widget?", "product"),
            "widget"
        );
        // Last occurrence wins.
        assert_eq!(
            extract_after_keyword("product trend for product gizmo", "product"),
            "gizmo"
        );
        assert_eq!(extract_after_keyword("monthly trend", "product"), "");
        assert_eq!(extract_after_keyword("monthly trend for product", "product"), "");
    }

    #[test]
    fn monthly_trend_interpolates_extracted_product() {
        let catalog = PostgresCatalog::new();
        let sql = catalog.build_query("Show monthly sales trend for product Widget");
        assert!(sql.contains("ILIKE '%widget%'"), "got: {sql}");
        assert!(sql.contains("DATE_TRUNC('month', s.sale_date)"));
    }

    #[test]
    fn empty_entity_renders_match_everything_pattern() {
        let catalog = PostgresCatalog::new();
        let sql = catalog.build_query("monthly trend by product");
        assert!(sql.contains("ILIKE '%%'"), "got: {sql}");
    }

    #[test]
    fn quote_in_entity_cannot_break_out_of_literal() {
        let escaped = escape_literal_fragment("o'brien'; drop table sales --");
        assert!(!escaped.contains(';'));
        assert!(!escaped.contains("--"));
        assert!(!escaped.contains("'") || escaped.contains("''"));

        let catalog = PostgresCatalog::new();
        let sql = catalog.build_query("monthly trend for product o'brien");
        assert!(sql.contains("o''brien"), "got: {sql}");
    }

    #[test]
    fn postgres_rules_keep_their_own_order() {
        // "compare spending by product and region" matches both the
        // compare rule (rule 4) and the spending rule (rule 6); the
        // compare rule is declared first in this catalog.
        let catalog = PostgresCatalog::new();
        let sql = catalog.build_query("compare spending by product and region");
        assert!(sql.contains("GROUP BY p.product_name, c.region"), "got: {sql}");
    }

    #[test]
    fn postgres_defaults_differ_from_oracle() {
        assert_ne!(
            OracleCatalog::new().default_query(),
            PostgresCatalog::new().default_query()
        );
    }
}
