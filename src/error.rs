use thiserror::Error;

/// User-facing errors.
///
/// Analysis never fails; these cover configuration, I/O, and binding
/// parameter values against an analyzed statement.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("sqlrewrite config error: {0}")]
    Config(String),

    #[error("row {row}: statement expects {expected} parameter(s), got {got}")]
    ParameterCount {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("parameter index {index} out of range (statement has {count} parameter(s))")]
    ParameterIndex { index: usize, count: usize },

    #[error("parameter {index} is not bound")]
    UnboundParameter { index: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RewriteError>;
