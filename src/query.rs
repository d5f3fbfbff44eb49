use smallvec::SmallVec;

use crate::classification::{RewriteBlocker, RewriteClassification};
use crate::error::{Result, RewriteError};
use crate::segment::{self, Segment};

/// Byte offsets of the parameter markers, in order.
pub type OffsetVec = SmallVec<[usize; 8]>;

/// A statement decomposed by [`crate::analyze`]. Immutable once built;
/// share it behind an `Arc` between every statement prepared from the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStatement {
    pub sql: String,
    pub no_backslash_escapes: bool,
    pub segments: Vec<Segment>,
    pub parameter_offsets: OffsetVec,
    pub classification: RewriteClassification,
}

impl ParsedStatement {
    pub fn parameter_count(&self) -> usize {
        self.parameter_offsets.len()
    }

    pub fn is_rewritable(&self) -> bool {
        self.classification.is_rewritable()
    }

    pub fn blocker(&self) -> Option<RewriteBlocker> {
        self.classification.blocker()
    }

    /// Render one execution with `values` substituted for the parameters.
    pub fn render<S: AsRef<str>>(&self, values: &[S]) -> Result<String> {
        check_row(0, self.parameter_count(), values.len())?;
        let mut out = String::with_capacity(self.rendered_len(values));
        segment::render_into(&self.segments, values, &mut out);
        Ok(out)
    }

    /// Byte length of `render(values)`.
    pub fn rendered_len<S: AsRef<str>>(&self, values: &[S]) -> usize {
        segment::rendered_len(&self.segments, values)
    }

    /// Split the statement around its first `VALUES` tuple.
    /// Only available for rewritable statements.
    pub fn rewrite_template(&self) -> Option<RewriteTemplate> {
        if !self.is_rewritable() {
            return None;
        }
        let (start, end) = self.classification.tuple_span()?;

        let mut tuple = Vec::with_capacity(2 * self.parameter_count() + 1);
        let mut text_start = start;
        for &offset in &self.parameter_offsets {
            tuple.push(Segment::Text(self.sql[text_start..offset].to_string()));
            tuple.push(Segment::Parameter);
            text_start = offset + 1;
        }
        tuple.push(Segment::Text(self.sql[text_start..end].to_string()));

        Some(RewriteTemplate {
            prefix: self.sql[..start].to_string(),
            tuple,
            suffix: self.sql[end..].to_string(),
        })
    }
}

/// `prefix + tuple_1 + "," + ... + tuple_N + suffix`.
///
/// `prefix` stops just before the tuple's `(`; `tuple` runs from that `(`
/// through its matching `)` and holds every parameter of the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteTemplate {
    pub prefix: String,
    pub tuple: Vec<Segment>,
    pub suffix: String,
}

impl RewriteTemplate {
    pub fn parameter_count(&self) -> usize {
        segment::parameter_count(&self.tuple)
    }

    /// Byte length of one rendered tuple.
    pub fn tuple_len<S: AsRef<str>>(&self, values: &[S]) -> usize {
        segment::rendered_len(&self.tuple, values)
    }

    /// Byte length of the text shared by every rewritten statement.
    pub fn fixed_len(&self) -> usize {
        self.prefix.len() + self.suffix.len()
    }

    /// Render one multi-row statement. `first_row` is the index of `rows[0]`
    /// in the whole batch and is only used for error reporting.
    pub fn render_rows<R, S>(&self, rows: &[R], first_row: usize) -> Result<String>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let expected = self.parameter_count();
        let mut len = self.fixed_len();
        for (i, row) in rows.iter().enumerate() {
            let values = row.as_ref();
            check_row(first_row + i, expected, values.len())?;
            len += self.tuple_len(values) + 1;
        }

        let mut out = String::with_capacity(len);
        out.push_str(&self.prefix);
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            segment::render_into(&self.tuple, row.as_ref(), &mut out);
        }
        out.push_str(&self.suffix);
        Ok(out)
    }
}

pub(crate) fn check_row(row: usize, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(RewriteError::ParameterCount { row, expected, got });
    }
    Ok(())
}
