use memchr::memchr_iter;

use crate::lexer::{self, LexState};

/// One statement cut out of a larger script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptStatement<'a> {
    /// Statement text without surrounding whitespace or the terminating `;`.
    pub text: &'a str,
    /// Byte offset of `text` in the script.
    pub offset: usize,
    /// 1-based line on which `text` starts.
    pub line: usize,
}

/// Split a script on top-level `;`, using the same lexer as the analyzer so
/// semicolons in strings, identifiers and comments never split.
/// Pieces holding nothing but whitespace and comments are dropped.
pub fn split_statements(script: &str, no_backslash_escapes: bool) -> Vec<ScriptStatement<'_>> {
    let bytes = script.as_bytes();
    let mut statements = Vec::new();
    let mut state = LexState::Normal;
    let mut start = 0;
    let mut has_content = false;
    let mut lines = LineCounter::default();
    let mut i = 0;

    while i < bytes.len() {
        let next = lexer::step(state, bytes, i, no_backslash_escapes);
        if state.is_normal() && next.state.is_normal() {
            match bytes[i] {
                b';' => {
                    if has_content {
                        statements.push(make_statement(script, start, i, &mut lines));
                    }
                    start = i + 1;
                    has_content = false;
                }
                b if b.is_ascii_whitespace() => {}
                _ => has_content = true,
            }
        } else if state.is_normal() && !next.state.is_comment() {
            has_content = true;
        }
        state = next.state;
        i += next.len;
    }
    if has_content {
        statements.push(make_statement(script, start, bytes.len(), &mut lines));
    }
    statements
}

fn make_statement<'a>(
    script: &'a str,
    start: usize,
    end: usize,
    lines: &mut LineCounter,
) -> ScriptStatement<'a> {
    let piece = &script[start..end];
    let text = piece.trim();
    let offset = start + (piece.len() - piece.trim_start().len());
    ScriptStatement {
        text,
        offset,
        line: lines.line_at(script.as_bytes(), offset),
    }
}

/// Incremental newline counter; offsets must be queried in increasing order.
#[derive(Default)]
struct LineCounter {
    counted_upto: usize,
    newlines: usize,
}

impl LineCounter {
    fn line_at(&mut self, bytes: &[u8], offset: usize) -> usize {
        self.newlines += memchr_iter(b'\n', &bytes[self.counted_upto..offset]).count();
        self.counted_upto = offset;
        self.newlines + 1
    }
}
