pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod llm;
pub mod schema;

pub use dialect::SqlDialect;
pub use generator::QueryGenerator;
