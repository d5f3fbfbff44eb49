use tracing::trace;

use crate::classification::RewriteClassification;
use crate::lexer::{self, is_word_byte, scan_word, skip_whitespace, LexState, Step};
use crate::query::{OffsetVec, ParsedStatement};
use crate::segment::Segment;
use crate::token::{keyword, Keyword};

/// Decompose `sql` into text and parameter segments and classify whether it
/// can be rewritten as a multi-row `VALUES` batch.
///
/// Never fails: SQL the scan cannot confidently classify is reported as not
/// rewritable. The result is a pure function of the two arguments.
pub fn analyze(sql: &str, no_backslash_escapes: bool) -> ParsedStatement {
    Analyzer::new(sql, no_backslash_escapes).run()
}

/// Scan state for one pass over one statement.
struct Analyzer<'a> {
    sql: &'a str,
    bytes: &'a [u8],
    no_backslash_escapes: bool,
    state: LexState,
    pos: usize,
    /// Start of the text not yet emitted as a segment.
    text_start: usize,
    depth: i32,
    /// Parenthesis depth just before the first tuple's `(`.
    tuple_base_depth: i32,
    segments: Vec<Segment>,
    parameter_offsets: OffsetVec,
    classification: RewriteClassification,
    /// Anything other than whitespace or comments has been seen.
    seen_token: bool,
    /// A top-level `;` with nothing significant after it yet.
    semicolon_pending: bool,
    saw_semicolon: bool,
    saw_line_comment: bool,
    /// Last byte consumed in `Normal` state. Comments count as a space.
    prev_byte: Option<u8>,
}

impl<'a> Analyzer<'a> {
    fn new(sql: &'a str, no_backslash_escapes: bool) -> Self {
        Self {
            sql,
            bytes: sql.as_bytes(),
            no_backslash_escapes,
            state: LexState::Normal,
            pos: 0,
            text_start: 0,
            depth: 0,
            tuple_base_depth: 0,
            segments: Vec::new(),
            parameter_offsets: OffsetVec::new(),
            classification: RewriteClassification::default(),
            seen_token: false,
            semicolon_pending: false,
            saw_semicolon: false,
            saw_line_comment: false,
            prev_byte: None,
        }
    }

    fn run(mut self) -> ParsedStatement {
        while self.pos < self.bytes.len() {
            let next = lexer::step(
                self.state,
                self.bytes,
                self.pos,
                self.no_backslash_escapes,
            );
            if self.state.is_normal() && next.state.is_normal() {
                self.lex_normal();
            } else {
                self.transition(next);
            }
        }
        self.finish()
    }

    /// Apply a state change, or consume a body inside a string, identifier or comment.
    fn transition(&mut self, next: Step) {
        if self.state.is_normal() {
            if next.state == LexState::LineComment {
                self.saw_line_comment = true;
            } else if !next.state.is_comment() {
                self.mark_content();
            }
        } else if next.state.is_normal() {
            self.prev_byte = if self.state.is_comment() {
                Some(b' ')
            } else {
                Some(self.bytes[self.pos + next.len - 1])
            };
        }
        self.state = next.state;
        self.pos += next.len;
    }

    /// Consume one token in `Normal` state: a single byte, or a whole word.
    fn lex_normal(&mut self) {
        let b = self.bytes[self.pos];
        match b {
            b'?' => {
                self.mark_content();
                self.parameter();
            }
            b'(' => {
                self.mark_content();
                self.depth += 1;
            }
            b')' => {
                self.mark_content();
                self.depth -= 1;
                if self.classification.values_clause_start.is_some()
                    && self.classification.tuple_close_offset.is_none()
                    && self.depth == self.tuple_base_depth
                {
                    self.classification.tuple_close_offset = Some(self.pos);
                }
            }
            b';' => {
                self.mark_content();
                self.semicolon_pending = true;
                self.saw_semicolon = true;
            }
            _ if b.is_ascii_whitespace() => {}
            _ if is_word_byte(b) => {
                self.word();
                return;
            }
            _ => self.mark_content(),
        }
        self.prev_byte = Some(b);
        self.pos += 1;
    }

    fn word(&mut self) {
        let len = scan_word(&self.bytes[self.pos..]);
        let end = self.pos + len;
        let first_token = !self.seen_token;
        self.mark_content();

        match keyword(&self.bytes[self.pos..end]) {
            Some(Keyword::Insert) if first_token => {
                self.classification.is_insert_statement = true;
            }
            Some(Keyword::Values) => self.values_keyword(end),
            Some(Keyword::Select) => self.classification.looks_like_select = true,
            Some(Keyword::LastInsertId) => {
                self.classification.references_last_insert_id = true;
            }
            _ => {}
        }

        self.prev_byte = Some(self.bytes[end - 1]);
        self.pos = end;
    }

    /// Record the first `VALUES (` tuple. `after` is the offset just past the keyword.
    fn values_keyword(&mut self, after: usize) {
        if self.classification.values_clause_start.is_some() {
            return;
        }
        let at_boundary = match self.prev_byte {
            None => true,
            Some(b) => b.is_ascii_whitespace() || b == b'(' || b == b')',
        };
        if !at_boundary {
            return;
        }
        let open = after + skip_whitespace(&self.bytes[after..]);
        if self.bytes.get(open) == Some(&b'(') {
            self.classification.values_clause_start = Some(open);
            self.tuple_base_depth = self.depth;
        }
    }

    fn parameter(&mut self) {
        self.flush_text(self.pos);
        self.segments.push(Segment::Parameter);
        self.parameter_offsets.push(self.pos);
        self.text_start = self.pos + 1;

        if self.classification.tuple_close_offset.is_some() {
            self.classification.has_trailing_content_after_last_tuple = true;
        } else if self.classification.values_clause_start.is_none() {
            self.classification.has_parameter_before_tuple = true;
        }
    }

    fn mark_content(&mut self) {
        if self.semicolon_pending {
            self.classification.contains_top_level_semicolon = true;
        }
        self.seen_token = true;
    }

    fn flush_text(&mut self, end: usize) {
        self.segments
            .push(Segment::Text(self.sql[self.text_start..end].to_string()));
    }

    fn finish(mut self) -> ParsedStatement {
        self.flush_text(self.bytes.len());

        let ends_inside_literal =
            self.state.is_quoted() || self.state == LexState::BlockComment;
        self.classification.ends_inside_literal = ends_inside_literal;
        self.classification.multi_query_capable =
            !self.saw_semicolon && !self.saw_line_comment && !ends_inside_literal;

        trace!(
            parameters = self.parameter_offsets.len(),
            end_state = ?self.state,
            blocker = ?self.classification.blocker(),
            "analyzed statement"
        );

        ParsedStatement {
            sql: self.sql.to_string(),
            no_backslash_escapes: self.no_backslash_escapes,
            segments: self.segments,
            parameter_offsets: self.parameter_offsets,
            classification: self.classification,
        }
    }
}
