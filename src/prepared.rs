use std::sync::Arc;

use crate::batch::{plan_batch, BatchOptions, BatchPlan};
use crate::cache::StatementCache;
use crate::error::{Result, RewriteError};
use crate::query::ParsedStatement;

/// A statement template plus the values bound to it.
///
/// The template is immutable and shared; only bindings and queued batch rows
/// belong to this instance. Values are already-rendered SQL literals
/// (`'text'`, `42`, `NULL`, ...).
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    template: Arc<ParsedStatement>,
    parameters: Vec<Option<String>>,
    batch: Vec<Vec<String>>,
}

impl PreparedStatement {
    pub fn new(template: Arc<ParsedStatement>) -> Self {
        let count = template.parameter_count();
        Self {
            template,
            parameters: vec![None; count],
            batch: Vec::new(),
        }
    }

    /// Prepare `sql` through the connection's statement cache.
    pub fn prepare(cache: &mut StatementCache, sql: &str, no_backslash_escapes: bool) -> Self {
        Self::new(cache.get_or_analyze(sql, no_backslash_escapes))
    }

    pub fn template(&self) -> &Arc<ParsedStatement> {
        &self.template
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Bind the parameter at 1-based `index`.
    pub fn set_parameter(&mut self, index: usize, literal: impl Into<String>) -> Result<()> {
        let count = self.parameters.len();
        let slot = index
            .checked_sub(1)
            .and_then(|i| self.parameters.get_mut(i))
            .ok_or(RewriteError::ParameterIndex { index, count })?;
        *slot = Some(literal.into());
        Ok(())
    }

    pub fn clear_parameters(&mut self) {
        self.parameters.iter_mut().for_each(|p| *p = None);
    }

    fn bound_values(&self) -> Result<Vec<String>> {
        self.parameters
            .iter()
            .enumerate()
            .map(|(i, value)| {
                value
                    .clone()
                    .ok_or(RewriteError::UnboundParameter { index: i + 1 })
            })
            .collect()
    }

    /// The text of a single execution with the current bindings.
    pub fn to_sql(&self) -> Result<String> {
        self.template.render(&self.bound_values()?)
    }

    /// Queue the current bindings as one batch row. Bindings are kept, so
    /// callers may change only the values that differ for the next row.
    pub fn add_batch(&mut self) -> Result<()> {
        let row = self.bound_values()?;
        self.batch.push(row);
        Ok(())
    }

    pub fn clear_batch(&mut self) {
        self.batch.clear();
    }

    pub fn batch_size(&self) -> usize {
        self.batch.len()
    }

    /// Statements that execute every queued row.
    pub fn execute_batch_plan(&self, options: &BatchOptions) -> Result<BatchPlan> {
        plan_batch(&self.template, &self.batch, options)
    }

    /// A fresh statement over the same shared template, with nothing bound
    /// and an empty batch. Used to replay a statement on another connection.
    pub fn rebind(&self) -> Self {
        Self::new(Arc::clone(&self.template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchStrategy;
    use pretty_assertions::assert_eq;

    fn insert() -> PreparedStatement {
        let mut cache = StatementCache::new(8);
        PreparedStatement::prepare(&mut cache, "INSERT INTO t (a, b) VALUES (?, ?)", false)
    }

    #[test]
    fn test_bind_and_render() {
        let mut stmt = insert();
        stmt.set_parameter(1, "1").unwrap();
        stmt.set_parameter(2, "'x'").unwrap();
        assert_eq!(stmt.to_sql().unwrap(), "INSERT INTO t (a, b) VALUES (1, 'x')");
    }

    #[test]
    fn test_parameter_index_bounds() {
        let mut stmt = insert();
        assert!(matches!(
            stmt.set_parameter(0, "1"),
            Err(RewriteError::ParameterIndex { index: 0, count: 2 })
        ));
        assert!(matches!(
            stmt.set_parameter(3, "1"),
            Err(RewriteError::ParameterIndex { index: 3, count: 2 })
        ));
    }

    #[test]
    fn test_unbound_parameter() {
        let mut stmt = insert();
        stmt.set_parameter(1, "1").unwrap();
        assert!(matches!(
            stmt.add_batch(),
            Err(RewriteError::UnboundParameter { index: 2 })
        ));
        assert_eq!(stmt.batch_size(), 0);
    }

    #[test]
    fn test_batch_rewrite() {
        let mut stmt = insert();
        stmt.set_parameter(1, "1").unwrap();
        stmt.set_parameter(2, "'x'").unwrap();
        stmt.add_batch().unwrap();
        stmt.set_parameter(1, "2").unwrap();
        stmt.add_batch().unwrap();
        assert_eq!(stmt.batch_size(), 2);

        let plan = stmt.execute_batch_plan(&BatchOptions::default()).unwrap();
        assert_eq!(plan.strategy, BatchStrategy::Rewrite);
        assert_eq!(
            plan.statements,
            vec!["INSERT INTO t (a, b) VALUES (1, 'x'),(2, 'x')".to_string()]
        );

        stmt.clear_batch();
        assert_eq!(stmt.batch_size(), 0);
    }

    #[test]
    fn test_rebind_shares_template() {
        let mut stmt = insert();
        stmt.set_parameter(1, "1").unwrap();
        stmt.set_parameter(2, "2").unwrap();
        stmt.add_batch().unwrap();

        let clone = stmt.rebind();
        assert!(Arc::ptr_eq(stmt.template(), clone.template()));
        assert_eq!(clone.batch_size(), 0);
        assert!(clone.to_sql().is_err());
    }

    #[test]
    fn test_clear_parameters() {
        let mut stmt = insert();
        stmt.set_parameter(1, "1").unwrap();
        stmt.clear_parameters();
        assert!(matches!(
            stmt.to_sql(),
            Err(RewriteError::UnboundParameter { index: 1 })
        ));
    }
}
