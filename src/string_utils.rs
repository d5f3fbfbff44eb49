use memchr::{memchr, memchr2};

/// Offset just past the `\n` that ends a line comment body.
/// Returns `None` when the comment runs to the end of input.
pub(crate) fn find_line_end(bytes: &[u8]) -> Option<usize> {
    memchr(b'\n', bytes).map(|offset| offset + 1)
}

/// Offset just past the `*/` that closes a block comment body.
/// `bytes` starts after the opening `/*`.
pub(crate) fn find_block_comment_end(bytes: &[u8]) -> Option<usize> {
    let mut j = 0;
    while let Some(offset) = memchr(b'*', &bytes[j..]) {
        let star = j + offset;
        if bytes.get(star + 1) == Some(&b'/') {
            return Some(star + 2);
        }
        j = star + 1;
    }
    None
}

/// Offset of the next byte inside a string body that can change lexer state:
/// the closing quote, or a backslash when backslash escapes are honored.
pub(crate) fn find_string_stop(bytes: &[u8], quote: u8, backslash_escapes: bool) -> Option<usize> {
    if backslash_escapes {
        memchr2(quote, b'\\', bytes)
    } else {
        memchr(quote, bytes)
    }
}

/// Offset just past the backtick closing a quoted identifier.
pub(crate) fn find_backtick_end(bytes: &[u8]) -> Option<usize> {
    memchr(b'`', bytes).map(|offset| offset + 1)
}
