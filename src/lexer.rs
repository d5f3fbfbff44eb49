use crate::string_utils::{
    find_backtick_end, find_block_comment_end, find_line_end, find_string_stop,
};

/// Which quote character opened a string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteKind {
    Single,
    Double,
}

impl QuoteKind {
    pub fn byte(self) -> u8 {
        match self {
            Self::Single => b'\'',
            Self::Double => b'"',
        }
    }

    /// The string state this quote kind lexes in.
    pub fn string_state(self) -> LexState {
        match self {
            Self::Single => LexState::InSingleQuoteString,
            Self::Double => LexState::InDoubleQuoteString,
        }
    }
}

/// Lexical context at a scan position. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexState {
    Normal,
    InSingleQuoteString,
    InDoubleQuoteString,
    InBacktickIdentifier,
    LineComment,
    BlockComment,
    /// A backslash was seen inside a string; the next byte is taken literally
    /// and the scan returns to the enclosing string state.
    EscapeNext(QuoteKind),
}

impl LexState {
    pub fn is_normal(self) -> bool {
        matches!(self, Self::Normal)
    }

    pub fn is_comment(self) -> bool {
        matches!(self, Self::LineComment | Self::BlockComment)
    }

    /// String, identifier, or pending escape.
    pub fn is_quoted(self) -> bool {
        matches!(
            self,
            Self::InSingleQuoteString
                | Self::InDoubleQuoteString
                | Self::InBacktickIdentifier
                | Self::EscapeNext(_)
        )
    }
}

/// Result of one lexer transition: the state after it and how many bytes it consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub state: LexState,
    pub len: usize,
}

impl Step {
    fn new(state: LexState, len: usize) -> Self {
        Self { state, len }
    }
}

/// Advance the lexer from `state` at byte offset `i` (which must be in bounds).
///
/// In `Normal` state exactly one byte is consumed, or two for the `--` and `/*`
/// comment openers. Inside strings, identifiers and comments the whole body up to
/// and including the next state-changing byte is consumed at once. Every step
/// consumes at least one byte.
pub fn step(state: LexState, bytes: &[u8], i: usize, no_backslash_escapes: bool) -> Step {
    let rest = &bytes[i..];
    match state {
        LexState::Normal => match rest[0] {
            b'\'' => Step::new(LexState::InSingleQuoteString, 1),
            b'"' => Step::new(LexState::InDoubleQuoteString, 1),
            b'`' => Step::new(LexState::InBacktickIdentifier, 1),
            b'#' => Step::new(LexState::LineComment, 1),
            b'-' if rest.get(1) == Some(&b'-') => Step::new(LexState::LineComment, 2),
            b'/' if rest.get(1) == Some(&b'*') => Step::new(LexState::BlockComment, 2),
            _ => Step::new(LexState::Normal, 1),
        },
        LexState::InSingleQuoteString => {
            string_step(QuoteKind::Single, rest, no_backslash_escapes)
        }
        LexState::InDoubleQuoteString => {
            string_step(QuoteKind::Double, rest, no_backslash_escapes)
        }
        LexState::EscapeNext(kind) => Step::new(kind.string_state(), 1),
        LexState::InBacktickIdentifier => match find_backtick_end(rest) {
            Some(end) => Step::new(LexState::Normal, end),
            None => Step::new(state, rest.len()),
        },
        LexState::LineComment => match find_line_end(rest) {
            Some(end) => Step::new(LexState::Normal, end),
            None => Step::new(state, rest.len()),
        },
        LexState::BlockComment => match find_block_comment_end(rest) {
            Some(end) => Step::new(LexState::Normal, end),
            None => Step::new(state, rest.len()),
        },
    }
}

fn string_step(kind: QuoteKind, rest: &[u8], no_backslash_escapes: bool) -> Step {
    match find_string_stop(rest, kind.byte(), !no_backslash_escapes) {
        Some(pos) if rest[pos] == kind.byte() => Step::new(LexState::Normal, pos + 1),
        Some(pos) => Step::new(LexState::EscapeNext(kind), pos + 1),
        None => Step::new(kind.string_state(), rest.len()),
    }
}

/// Identifier bytes: ASCII alphanumerics, `_`, `$`, and any non-ASCII byte.
#[inline]
pub fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// Byte length of the word starting at `bytes[0]`.
#[inline]
pub fn scan_word(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|&&b| is_word_byte(b)).count()
}

/// Byte length of leading ASCII whitespace, newlines included.
#[inline]
pub fn skip_whitespace(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_whitespace()).count()
}

/// Run the lexer over the whole input and return the state it ends in.
pub fn final_state(sql: &str, no_backslash_escapes: bool) -> LexState {
    let bytes = sql.as_bytes();
    let mut state = LexState::Normal;
    let mut i = 0;
    while i < bytes.len() {
        let next = step(state, bytes, i, no_backslash_escapes);
        state = next.state;
        i += next.len;
    }
    state
}
