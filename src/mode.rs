use serde::Deserialize;

use crate::batch::{BatchOptions, DEFAULT_MAX_ALLOWED_PACKET};
use crate::cache::DEFAULT_CACHE_SIZE;
use crate::sql_mode::SqlMode;

/// Mode holds the connection-level switches and CLI behavior for sqlrewrite.
#[derive(Debug, Clone, Deserialize)]
pub struct Mode {
    /// Treat `\` as an ordinary character inside string literals.
    #[serde(default)]
    pub no_backslash_escapes: bool,

    /// Server `sql_mode`; `NO_BACKSLASH_ESCAPES` in it has the same effect as
    /// `no_backslash_escapes`.
    #[serde(default)]
    pub sql_mode: Option<String>,

    #[serde(default = "default_true")]
    pub rewrite_batched_statements: bool,

    #[serde(default)]
    pub allow_multi_queries: bool,

    #[serde(default = "default_max_allowed_packet")]
    pub max_allowed_packet: usize,

    /// Analyzed statements kept per input (0 disables the cache).
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Glob patterns to exclude.
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub check: bool,

    /// Print segments and the rewrite template of every statement.
    #[serde(default)]
    pub explain: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub quiet: bool,

    #[serde(default)]
    pub no_color: bool,

    #[serde(default)]
    pub force_color: bool,

    /// Number of threads for parallel processing (0 = all cores).
    #[serde(default)]
    pub threads: usize,

    #[serde(default)]
    pub single_process: bool,
}

fn default_true() -> bool {
    true
}
fn default_max_allowed_packet() -> usize {
    DEFAULT_MAX_ALLOWED_PACKET
}
fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

impl Mode {
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            rewrite_batched_statements: self.rewrite_batched_statements,
            allow_multi_queries: self.allow_multi_queries,
            max_allowed_packet: self.max_allowed_packet,
        }
    }

    /// Escaping mode used to lex statement text.
    pub fn effective_no_backslash_escapes(&self) -> bool {
        self.no_backslash_escapes
            || self
                .sql_mode
                .as_deref()
                .is_some_and(|m| SqlMode::parse(m).no_backslash_escapes())
    }

    /// Whether color output is enabled.
    pub fn color(&self) -> bool {
        if self.force_color {
            return true;
        }
        if self.no_color {
            return false;
        }
        if std::env::var("NO_COLOR").is_ok() {
            return false;
        }
        true
    }

    /// SQL file extensions to process.
    pub fn sql_extensions(&self) -> &[&str] {
        &["sql", "ddl", "dml"]
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self {
            no_backslash_escapes: false,
            sql_mode: None,
            rewrite_batched_statements: true,
            allow_multi_queries: false,
            max_allowed_packet: DEFAULT_MAX_ALLOWED_PACKET,
            cache_size: DEFAULT_CACHE_SIZE,
            exclude: Vec::new(),
            check: false,
            explain: false,
            verbose: false,
            quiet: false,
            no_color: false,
            force_color: false,
            threads: 0,
            single_process: false,
        }
    }
}
