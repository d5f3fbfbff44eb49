use phf::phf_map;

/// Keywords that influence rewrite classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Insert,
    /// `VALUES` or its MariaDB synonym `VALUE`.
    Values,
    Select,
    LastInsertId,
}

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "insert" => Keyword::Insert,
    "values" => Keyword::Values,
    "value" => Keyword::Values,
    "select" => Keyword::Select,
    "last_insert_id" => Keyword::LastInsertId,
};

const MAX_KEYWORD_LEN: usize = 14;

/// Case-insensitive lookup of a whole word. Words longer than the longest
/// keyword are rejected before any lowercasing happens.
pub fn keyword(word: &[u8]) -> Option<Keyword> {
    if word.is_empty() || word.len() > MAX_KEYWORD_LEN {
        return None;
    }
    let mut buf = [0u8; MAX_KEYWORD_LEN];
    let lower = &mut buf[..word.len()];
    lower.copy_from_slice(word);
    lower.make_ascii_lowercase();
    let text = std::str::from_utf8(lower).ok()?;
    KEYWORDS.get(text).copied()
}
