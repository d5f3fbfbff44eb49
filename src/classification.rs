use std::fmt;

/// What a single scan learned about whether a statement can be rewritten
/// as a multi-row `VALUES` batch. Offsets are byte offsets into the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewriteClassification {
    /// First token after leading whitespace and comments is `INSERT`.
    pub is_insert_statement: bool,
    /// Offset of the `(` opening the first `VALUES`/`VALUE` tuple.
    pub values_clause_start: Option<usize>,
    /// Offset of the `)` closing that tuple.
    pub tuple_close_offset: Option<usize>,
    /// A parameter appears after the tuple closed.
    pub has_trailing_content_after_last_tuple: bool,
    /// A top-level `;` is followed by more SQL.
    pub contains_top_level_semicolon: bool,
    /// `SELECT` appears outside strings, identifiers and comments.
    pub looks_like_select: bool,
    /// A parameter appears before the tuple opened.
    pub has_parameter_before_tuple: bool,
    /// `LAST_INSERT_ID` appears outside strings, identifiers and comments.
    pub references_last_insert_id: bool,
    /// The scan ended inside a string, identifier, escape or block comment.
    pub ends_inside_literal: bool,
    /// Safe to join with other statements using `;` in one multi-statement packet.
    pub multi_query_capable: bool,
}

/// First reason a statement was not classified as rewritable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewriteBlocker {
    NotInsert,
    NoValuesClause,
    UnterminatedTuple,
    ParameterBeforeTuple,
    TrailingParameter,
    MultipleStatements,
    ContainsSelect,
    LastInsertId,
    UnterminatedLiteral,
}

impl RewriteBlocker {
    pub fn description(self) -> &'static str {
        match self {
            Self::NotInsert => "not an INSERT statement",
            Self::NoValuesClause => "no VALUES tuple",
            Self::UnterminatedTuple => "VALUES tuple is never closed",
            Self::ParameterBeforeTuple => "parameter before the VALUES tuple",
            Self::TrailingParameter => "parameter after the VALUES tuple",
            Self::MultipleStatements => "multiple statements",
            Self::ContainsSelect => "contains SELECT",
            Self::LastInsertId => "references LAST_INSERT_ID",
            Self::UnterminatedLiteral => "unterminated string, identifier or comment",
        }
    }
}

impl fmt::Display for RewriteBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl RewriteClassification {
    /// The first condition that rules out rewriting, or `None` when the
    /// statement can be rewritten.
    pub fn blocker(&self) -> Option<RewriteBlocker> {
        if !self.is_insert_statement {
            return Some(RewriteBlocker::NotInsert);
        }
        if self.values_clause_start.is_none() {
            return Some(RewriteBlocker::NoValuesClause);
        }
        if self.tuple_close_offset.is_none() {
            return Some(RewriteBlocker::UnterminatedTuple);
        }
        if self.has_parameter_before_tuple {
            return Some(RewriteBlocker::ParameterBeforeTuple);
        }
        if self.has_trailing_content_after_last_tuple {
            return Some(RewriteBlocker::TrailingParameter);
        }
        if self.contains_top_level_semicolon {
            return Some(RewriteBlocker::MultipleStatements);
        }
        if self.looks_like_select {
            return Some(RewriteBlocker::ContainsSelect);
        }
        if self.references_last_insert_id {
            return Some(RewriteBlocker::LastInsertId);
        }
        if self.ends_inside_literal {
            return Some(RewriteBlocker::UnterminatedLiteral);
        }
        None
    }

    pub fn is_rewritable(&self) -> bool {
        self.blocker().is_none()
    }

    /// Byte range of the first tuple, parentheses included.
    pub fn tuple_span(&self) -> Option<(usize, usize)> {
        match (self.values_clause_start, self.tuple_close_offset) {
            (Some(start), Some(close)) => Some((start, close + 1)),
            _ => None,
        }
    }
}
