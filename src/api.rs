use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::cache::StatementCache;
use crate::mode::Mode;
use crate::report::{FileResult, Report, StatementReport};
use crate::splitter::split_statements;

/// Analyze every statement of a SQL script.
///
/// Statements are looked up through a [`StatementCache`] sized by
/// `mode.cache_size`, so text repeated within the script is analyzed once.
pub fn analyze_script(source: &str, mode: &Mode) -> Vec<StatementReport> {
    let no_backslash_escapes = mode.effective_no_backslash_escapes();
    let mut cache = StatementCache::new(mode.cache_size);

    let reports: Vec<StatementReport> = split_statements(source, no_backslash_escapes)
        .into_iter()
        .map(|stmt| StatementReport {
            line: stmt.line,
            statement: cache.get_or_analyze(stmt.text, no_backslash_escapes),
        })
        .collect();

    let stats = cache.stats();
    debug!(
        statements = reports.len(),
        cache_hits = stats.hits,
        cache_misses = stats.misses,
        "analyzed script"
    );
    reports
}

/// Run the analyzer on a collection of files.
pub fn run(files: &[PathBuf], mode: &Mode) -> Report {
    let matching_paths = get_matching_paths(files, mode);
    let mut report = Report::new();

    if mode.single_process || matching_paths.len() <= 1 {
        for path in &matching_paths {
            report.add(analyze_file(path, mode));
        }
        return report;
    }

    // Parallel processing with rayon
    use rayon::prelude::*;

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(mode.threads)
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            warn!(error = %e, "failed to build thread pool, analyzing sequentially");
            for path in &matching_paths {
                report.add(analyze_file(path, mode));
            }
            return report;
        }
    };

    let results: Vec<FileResult> = pool.install(|| {
        matching_paths
            .par_iter()
            .map(|path| analyze_file(path, mode))
            .collect()
    });
    for result in results {
        report.add(result);
    }

    report
}

/// Analyze a single file.
pub fn analyze_file(path: &Path, mode: &Mode) -> FileResult {
    match std::fs::read_to_string(path) {
        Ok(source) => FileResult::analyzed(path.to_path_buf(), analyze_script(&source, mode)),
        Err(e) => FileResult::error(path.to_path_buf(), format!("Read error: {}", e)),
    }
}

/// Get all SQL file paths that match the given inputs.
pub fn get_matching_paths(paths: &[PathBuf], mode: &Mode) -> Vec<PathBuf> {
    let extensions = mode.sql_extensions();
    let exclude = compile_patterns(&mode.exclude);
    let mut result = HashSet::new();

    for path in paths {
        if path.is_file() {
            if is_sql_file(path, extensions) {
                result.insert(path.clone());
            }
        } else if path.is_dir() {
            collect_sql_files(path, extensions, &exclude, &mut result);
        } else {
            // Surfaces as a read error in the report.
            result.insert(path.clone());
        }
    }

    let mut sorted: Vec<PathBuf> = result.into_iter().collect();
    sorted.sort();
    sorted
}

fn compile_patterns(patterns: &[String]) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(pattern = %p, error = %e, "ignoring invalid exclude pattern");
                None
            }
        })
        .collect()
}

/// Check if a file has a SQL extension.
fn is_sql_file(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

/// Recursively collect SQL files from a directory.
fn collect_sql_files(
    dir: &Path,
    extensions: &[&str],
    exclude: &[glob::Pattern],
    result: &mut HashSet<PathBuf>,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        // Skip hidden directories and excluded patterns
        if name.starts_with('.') || exclude.iter().any(|p| p.matches(&name)) {
            continue;
        }

        if path.is_dir() {
            collect_sql_files(&path, extensions, exclude, result);
        } else if is_sql_file(&path, extensions) {
            result.insert(path);
        }
    }
}
