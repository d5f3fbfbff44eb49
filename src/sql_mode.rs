use std::fmt;
use std::str::FromStr;

use crate::error::RewriteError;

/// Flags of a server `sql_mode` value such as
/// `STRICT_TRANS_TABLES,NO_BACKSLASH_ESCAPES`.
///
/// Only `NO_BACKSLASH_ESCAPES` changes how statement text is lexed; the other
/// flags are kept so the value can be echoed back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlMode {
    flags: Vec<String>,
}

impl SqlMode {
    pub fn parse(value: &str) -> Self {
        let mut flags: Vec<String> = Vec::new();
        for flag in value.split(',') {
            let flag = flag.trim().to_ascii_uppercase();
            if !flag.is_empty() && !flags.contains(&flag) {
                flags.push(flag);
            }
        }
        Self { flags }
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case(flag))
    }

    pub fn no_backslash_escapes(&self) -> bool {
        self.contains("NO_BACKSLASH_ESCAPES")
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }
}

impl FromStr for SqlMode {
    type Err = RewriteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(bad) = s
            .split(',')
            .map(str::trim)
            .find(|f| !f.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_'))
        {
            return Err(RewriteError::Config(format!("Invalid sql_mode flag: {bad:?}")));
        }
        Ok(Self::parse(s))
    }
}

impl fmt::Display for SqlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flags.join(","))
    }
}
