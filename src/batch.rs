use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::query::{check_row, ParsedStatement};

/// Default `max_allowed_packet` of MariaDB 10.2+ (16 MiB).
pub const DEFAULT_MAX_ALLOWED_PACKET: usize = 16 * 1024 * 1024;

/// Connection-level switches that decide how a batch is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BatchOptions {
    /// Merge rows of a rewritable INSERT into multi-row statements.
    #[serde(default = "default_true")]
    pub rewrite_batched_statements: bool,

    /// Join executions with `;` into multi-statement queries.
    #[serde(default)]
    pub allow_multi_queries: bool,

    /// Upper bound, in bytes, for one generated statement.
    #[serde(default = "default_max_allowed_packet")]
    pub max_allowed_packet: usize,
}

fn default_true() -> bool {
    true
}
fn default_max_allowed_packet() -> usize {
    DEFAULT_MAX_ALLOWED_PACKET
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            rewrite_batched_statements: true,
            allow_multi_queries: false,
            max_allowed_packet: DEFAULT_MAX_ALLOWED_PACKET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchStrategy {
    /// `INSERT ... VALUES (..),(..),...`
    Rewrite,
    /// `stmt1;stmt2;...`
    MultiQuery,
    /// One round trip per row.
    PerStatement,
}

impl BatchStrategy {
    pub fn choose(statement: &ParsedStatement, options: &BatchOptions) -> Self {
        if options.rewrite_batched_statements && statement.is_rewritable() {
            Self::Rewrite
        } else if options.allow_multi_queries && statement.classification.multi_query_capable {
            Self::MultiQuery
        } else {
            Self::PerStatement
        }
    }
}

/// The SQL texts to send for one batch, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub strategy: BatchStrategy,
    pub statements: Vec<String>,
}

/// Turn `rows` of bound values (already rendered SQL literals) into the
/// statements that execute them.
///
/// Rows are packed greedily: a new statement starts when the next row would
/// push the current one past `max_allowed_packet`. A row that alone exceeds
/// the limit still gets its own statement; the server reports that error.
pub fn plan_batch<R, S>(
    statement: &ParsedStatement,
    rows: &[R],
    options: &BatchOptions,
) -> Result<BatchPlan>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let strategy = BatchStrategy::choose(statement, options);
    let statements = match strategy {
        BatchStrategy::Rewrite => rewrite_rows(statement, rows, options.max_allowed_packet)?,
        BatchStrategy::MultiQuery => join_rows(statement, rows, options.max_allowed_packet)?,
        BatchStrategy::PerStatement => rows
            .iter()
            .map(|row| statement.render(row.as_ref()))
            .collect::<Result<Vec<_>>>()?,
    };

    debug!(
        ?strategy,
        rows = rows.len(),
        statements = statements.len(),
        "planned batch"
    );

    Ok(BatchPlan {
        strategy,
        statements,
    })
}

fn rewrite_rows<R, S>(
    statement: &ParsedStatement,
    rows: &[R],
    max_len: usize,
) -> Result<Vec<String>>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let Some(template) = statement.rewrite_template() else {
        return rows
            .iter()
            .map(|row| statement.render(row.as_ref()))
            .collect();
    };
    let expected = template.parameter_count();

    let mut statements = Vec::new();
    let mut start = 0;
    let mut len = template.fixed_len();
    for (i, row) in rows.iter().enumerate() {
        let values = row.as_ref();
        check_row(i, expected, values.len())?;
        let tuple_len = template.tuple_len(values);
        if i > start && len + 1 + tuple_len > max_len {
            statements.push(template.render_rows(&rows[start..i], start)?);
            start = i;
            len = template.fixed_len() + tuple_len;
        } else {
            len += tuple_len + usize::from(i > start);
        }
    }
    if start < rows.len() {
        statements.push(template.render_rows(&rows[start..], start)?);
    }
    Ok(statements)
}

fn join_rows<R, S>(statement: &ParsedStatement, rows: &[R], max_len: usize) -> Result<Vec<String>>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut pending = 0;
    for row in rows {
        let rendered = statement.render(row.as_ref())?;
        if pending > 0 && current.len() + 1 + rendered.len() > max_len {
            statements.push(std::mem::take(&mut current));
            pending = 0;
        }
        if pending > 0 {
            current.push(';');
        }
        current.push_str(&rendered);
        pending += 1;
    }
    if pending > 0 {
        statements.push(current);
    }
    Ok(statements)
}
