pub mod analyzer;
pub mod api;
pub mod batch;
pub mod cache;
pub mod classification;
pub mod config;
pub mod error;
pub mod lexer;
pub mod mode;
pub mod prepared;
pub mod query;
pub mod report;
pub mod segment;
pub mod splitter;
pub mod sql_mode;
mod string_utils;
pub mod token;

// Re-export the main public API
pub use analyzer::analyze;
pub use api::{analyze_file, analyze_script, get_matching_paths, run};
pub use batch::{plan_batch, BatchOptions, BatchPlan, BatchStrategy};
pub use cache::StatementCache;
pub use classification::{RewriteBlocker, RewriteClassification};
pub use config::load_config;
pub use error::{Result, RewriteError};
pub use mode::Mode;
pub use prepared::PreparedStatement;
pub use query::{ParsedStatement, RewriteTemplate};
pub use segment::Segment;
pub use sql_mode::SqlMode;
