use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, RewriteError};
use crate::mode::Mode;
use crate::sql_mode::SqlMode;

const CONFIG_FILE_NAME: &str = "sqlrewrite.toml";

/// Load sqlrewrite configuration.
///
/// Without an explicit path, the common parent directories of `files` are
/// searched for `sqlrewrite.toml` or a `pyproject.toml` carrying a
/// `[tool.sqlrewrite]` table, then the user config directory.
pub fn load_config(files: &[PathBuf], config_path: Option<&Path>) -> Result<Mode> {
    let mut mode = Mode::default();

    let config_file = match config_path {
        Some(path) => {
            if path.exists() {
                Some(path.to_path_buf())
            } else {
                return Err(RewriteError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }
        None => find_config_file(files).or_else(user_config_file),
    };

    if let Some(path) = config_file {
        debug!(path = %path.display(), "loading config");
        let raw = load_config_from_path(&path)?;
        apply_config(&mut mode, &raw)?;
    }

    Ok(mode)
}

/// Search the common parent directories of the given files, most specific first.
fn find_config_file(files: &[PathBuf]) -> Option<PathBuf> {
    for parent in get_common_parents(files) {
        let config = parent.join(CONFIG_FILE_NAME);
        if config.exists() {
            return Some(config);
        }
        let config = parent.join("pyproject.toml");
        if config.exists() {
            return Some(config);
        }
    }
    None
}

fn user_config_file() -> Option<PathBuf> {
    let config = dirs::config_dir()?.join("sqlrewrite").join(CONFIG_FILE_NAME);
    config.exists().then_some(config)
}

/// Get the common parent directories of the given file paths, ordered
/// from most specific to least specific.
fn get_common_parents(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut parents = Vec::new();

    for file in files {
        // stdin
        if file.as_os_str() == "-" {
            continue;
        }
        let parent = if file.is_dir() {
            file.clone()
        } else {
            match file.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            }
        };

        let mut current = Some(parent.as_path());
        while let Some(dir) = current {
            let dir_buf = dir.to_path_buf();
            if !parents.contains(&dir_buf) {
                parents.push(dir_buf);
            }
            current = dir.parent();
        }
    }

    parents
}

/// Load and parse a TOML config file into its sqlrewrite table.
fn load_config_from_path(path: &Path) -> Result<HashMap<String, toml::Value>> {
    let content = std::fs::read_to_string(path)?;
    let parsed: toml::Table = content.parse()?;

    let is_own_file = path
        .file_name()
        .is_some_and(|n| n == CONFIG_FILE_NAME);
    let section = if is_own_file {
        Some(&parsed)
    } else {
        parsed
            .get("tool")
            .and_then(|t| t.get("sqlrewrite"))
            .and_then(toml::Value::as_table)
    };

    Ok(section
        .map(|table| {
            table
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect()
        })
        .unwrap_or_default())
}

/// Apply configuration values to a Mode.
fn apply_config(mode: &mut Mode, config: &HashMap<String, toml::Value>) -> Result<()> {
    for (key, value) in config {
        match key.as_str() {
            "no_backslash_escapes" => mode.no_backslash_escapes = expect_bool(key, value)?,
            "rewrite_batched_statements" => {
                mode.rewrite_batched_statements = expect_bool(key, value)?
            }
            "allow_multi_queries" => mode.allow_multi_queries = expect_bool(key, value)?,
            "max_allowed_packet" => {
                let n = expect_usize(key, value)?;
                if n == 0 {
                    return Err(RewriteError::Config(
                        "max_allowed_packet must be greater than 0".to_string(),
                    ));
                }
                mode.max_allowed_packet = n;
            }
            "cache_size" => mode.cache_size = expect_usize(key, value)?,
            "sql_mode" => {
                let raw = value.as_str().ok_or_else(|| type_error(key, "a string"))?;
                let sql_mode: SqlMode = raw.parse()?;
                mode.sql_mode = Some(sql_mode.to_string());
            }
            "exclude" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| type_error(key, "an array of strings"))?;
                mode.exclude = arr
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect();
            }
            _ => {
                return Err(RewriteError::Config(format!(
                    "Unknown config option: {}",
                    key
                )))
            }
        }
    }

    Ok(())
}

fn expect_bool(key: &str, value: &toml::Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| type_error(key, "a boolean"))
}

fn expect_usize(key: &str, value: &toml::Value) -> Result<usize> {
    value
        .as_integer()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| type_error(key, "a non-negative integer"))
}

fn type_error(key: &str, expected: &str) -> RewriteError {
    RewriteError::Config(format!("Config option {} must be {}", key, expected))
}
