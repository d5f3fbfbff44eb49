use std::sync::Arc;

use pretty_assertions::assert_eq;
use sqlrewrite::lexer::{final_state, LexState};
use sqlrewrite::segment::{parameter_count, reassemble};
use sqlrewrite::{
    analyze, analyze_script, plan_batch, BatchOptions, BatchStrategy, Mode, PreparedStatement,
    RewriteBlocker, RewriteError, Segment, StatementCache,
};

/// Inputs exercising every lexer state, both escaping modes and odd endings.
const CORPUS: &[&str] = &[
    "",
    "?",
    "??",
    "INSERT INTO t VALUES (?)",
    "insert into t(a,b) values(?,?)",
    "INSERT INTO t VALUES (?, 'it''s ok')",
    "INSERT INTO t VALUES (?, 'a\\'b')",
    "INSERT INTO t VALUES (?, \"q?\\\"\", `c?``d`)",
    "INSERT INTO t VALUES (/* ? not a param */ ?)",
    "INSERT INTO t VALUES (?) -- trailing ?\n",
    "INSERT INTO t VALUES (?) # trailing ?",
    "SELECT * FROM t WHERE a = ? AND b = '?' AND c = \"?\"",
    "UPDATE t SET a=? WHERE b=?",
    "INSERT INTO t VALUES ('unterminated ?",
    "INSERT INTO t VALUES (? /* unterminated",
    "INSERT INTO t VALUES (?, '\\",
    "INSERT INTO `weird ? table` VALUES (?)",
    "INSERT INTO t VALUES (?, 'é?ü', ?) ; ",
    "--\n/**/?-?#?\n?",
    "INSERT INTO t VALUES (?, (SELECT 1)), (?, ?)",
];

#[test]
fn test_analysis_is_deterministic() {
    for sql in CORPUS {
        for nbe in [false, true] {
            assert_eq!(analyze(sql, nbe), analyze(sql, nbe), "input {:?}", sql);
        }
    }
}

#[test]
fn test_reassembly_reproduces_input() {
    for sql in CORPUS {
        for nbe in [false, true] {
            let parsed = analyze(sql, nbe);
            assert_eq!(reassemble(&parsed.segments, "?"), *sql);
        }
    }
}

#[test]
fn test_segments_alternate() {
    for sql in CORPUS {
        let parsed = analyze(sql, false);
        let params = parsed.parameter_count();
        assert_eq!(parsed.segments.len(), 2 * params + 1);
        assert_eq!(parameter_count(&parsed.segments), params);
        for (i, segment) in parsed.segments.iter().enumerate() {
            assert_eq!(segment.is_parameter(), i % 2 == 1, "input {:?}", sql);
        }
    }
}

#[test]
fn test_parameter_counts() {
    let expected = [0, 1, 2, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 0, 1, 1, 1, 2, 3, 3];
    for (sql, want) in CORPUS.iter().zip(expected) {
        assert_eq!(analyze(sql, false).parameter_count(), want, "input {:?}", sql);
    }
}

#[test]
fn test_parameter_offsets_point_at_markers() {
    for sql in CORPUS {
        let parsed = analyze(sql, false);
        for &offset in &parsed.parameter_offsets {
            assert_eq!(sql.as_bytes()[offset], b'?');
        }
    }
}

#[test]
fn test_empty_input() {
    let parsed = analyze("", false);
    assert_eq!(parsed.segments, vec![Segment::Text(String::new())]);
    assert_eq!(parsed.parameter_count(), 0);
    assert!(!parsed.is_rewritable());
}

#[test]
fn test_doubled_quote_escape() {
    let parsed = analyze("INSERT INTO t VALUES (?, 'it''s ok')", false);
    assert_eq!(parsed.parameter_count(), 1);
    assert!(parsed.is_rewritable());
}

#[test]
fn test_backslash_escape_modes() {
    let sql = "INSERT INTO t VALUES (?, 'a\\'b')";

    let escaped = analyze(sql, false);
    assert_eq!(final_state(sql, false), LexState::Normal);
    assert_eq!(escaped.parameter_count(), 1);
    assert!(escaped.is_rewritable());

    // The string closes at `\'`, so the final `'` opens a literal that never ends.
    let literal = analyze(sql, true);
    assert_eq!(final_state(sql, true), LexState::InSingleQuoteString);
    assert_eq!(literal.parameter_count(), 1);
    assert!(!literal.is_rewritable());
}

#[test]
fn test_comment_skipping() {
    let parsed = analyze("INSERT INTO t VALUES (/* ? not a param */ ?)", false);
    assert_eq!(parsed.parameter_count(), 1);
    assert!(parsed.is_rewritable());
}

#[test]
fn test_rewrite_acceptance() {
    let parsed = analyze("INSERT INTO t(a,b) VALUES (?,?)", false);
    assert!(parsed.is_rewritable());
    assert!(parsed.classification.is_insert_statement);
    assert_eq!(parsed.classification.values_clause_start, Some(26));
    assert_eq!(parsed.classification.tuple_close_offset, Some(30));
}

#[test]
fn test_rewrite_rejections() {
    let cases = [
        (
            "INSERT INTO t SELECT * FROM u WHERE x=?",
            RewriteBlocker::NoValuesClause,
        ),
        (
            "INSERT INTO t VALUES ((SELECT max(a) FROM u), ?)",
            RewriteBlocker::ContainsSelect,
        ),
        (
            "INSERT INTO t VALUES (?) ON DUPLICATE KEY UPDATE c=?",
            RewriteBlocker::TrailingParameter,
        ),
        (
            "INSERT INTO t VALUES (?); INSERT INTO t VALUES (?)",
            RewriteBlocker::TrailingParameter,
        ),
        (
            "INSERT INTO t VALUES (?); DELETE FROM u",
            RewriteBlocker::MultipleStatements,
        ),
        ("UPDATE t SET a=? WHERE b=?", RewriteBlocker::NotInsert),
        ("INSERT INTO t VALUES (?", RewriteBlocker::UnterminatedTuple),
    ];
    for (sql, blocker) in cases {
        let parsed = analyze(sql, false);
        assert!(!parsed.is_rewritable(), "input {:?}", sql);
        assert_eq!(parsed.blocker(), Some(blocker), "input {:?}", sql);
    }
}

#[test]
fn test_select_rejection_flags() {
    let parsed = analyze("INSERT INTO t SELECT * FROM u WHERE x=?", false);
    assert!(parsed.classification.looks_like_select);
    assert!(parsed.classification.is_insert_statement);
}

#[test]
fn test_non_insert() {
    let parsed = analyze("UPDATE t SET a=? WHERE b=?", false);
    assert!(!parsed.classification.is_insert_statement);
    assert!(!parsed.is_rewritable());
}

#[test]
fn test_keyword_word_boundaries() {
    let parsed = analyze("INSERT INTO myvalues_table VALUES (?)", false);
    assert_eq!(parsed.classification.values_clause_start, Some(34));
    assert!(parsed.is_rewritable());

    let parsed = analyze("INSERT INTO t (selected) VALUES (?)", false);
    assert!(!parsed.classification.looks_like_select);
    assert!(parsed.is_rewritable());
}

#[test]
fn test_existing_literal_tuples_do_not_block() {
    let parsed = analyze("INSERT INTO t VALUES (?, 1),(2, 3)", false);
    assert!(parsed.is_rewritable());
}

#[test]
fn test_batch_rewrite_end_to_end() {
    let parsed = analyze(
        "INSERT INTO t (a, b) VALUES (?, ?) ON DUPLICATE KEY UPDATE b = 1",
        false,
    );
    let rows = vec![vec!["1", "'x'"], vec!["2", "'y'"], vec!["3", "NULL"]];
    let plan = plan_batch(&parsed, &rows, &BatchOptions::default()).unwrap();
    assert_eq!(plan.strategy, BatchStrategy::Rewrite);
    assert_eq!(
        plan.statements,
        vec![
            "INSERT INTO t (a, b) VALUES (1, 'x'),(2, 'y'),(3, NULL) ON DUPLICATE KEY UPDATE b = 1"
                .to_string()
        ]
    );
}

#[test]
fn test_batch_disabled_rewrite_falls_back() {
    let parsed = analyze("INSERT INTO t VALUES (?)", false);
    let options = BatchOptions {
        rewrite_batched_statements: false,
        ..BatchOptions::default()
    };
    let rows = [["1"], ["2"]];
    let plan = plan_batch(&parsed, &rows, &options).unwrap();
    assert_eq!(plan.strategy, BatchStrategy::PerStatement);
    assert_eq!(plan.statements.len(), 2);
}

#[test]
fn test_cache_and_prepared_statements() {
    let mut cache = StatementCache::new(8);
    let mut first = PreparedStatement::prepare(&mut cache, "INSERT INTO t VALUES (?, ?)", false);
    let second = PreparedStatement::prepare(&mut cache, "INSERT INTO t VALUES (?, ?)", false);
    assert!(Arc::ptr_eq(first.template(), second.template()));
    assert_eq!(cache.stats().hits, 1);

    first.set_parameter(1, "1").unwrap();
    assert!(matches!(
        first.add_batch(),
        Err(RewriteError::UnboundParameter { index: 2 })
    ));
    first.set_parameter(2, "'a'").unwrap();
    first.add_batch().unwrap();
    first.set_parameter(1, "2").unwrap();
    first.add_batch().unwrap();

    let plan = first.execute_batch_plan(&BatchOptions::default()).unwrap();
    assert_eq!(
        plan.statements,
        vec!["INSERT INTO t VALUES (1, 'a'),(2, 'a')".to_string()]
    );

    let clone = first.rebind();
    assert!(Arc::ptr_eq(clone.template(), first.template()));
    assert_eq!(clone.batch_size(), 0);
}

#[test]
fn test_analyze_script_with_mode() {
    let mode = Mode {
        sql_mode: Some("NO_BACKSLASH_ESCAPES".to_string()),
        ..Mode::default()
    };
    let reports = analyze_script("INSERT INTO t VALUES ('C:\\', ?);\nSELECT 1;", &mode);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].parameter_count(), 1);
    assert!(reports[0].statement.is_rewritable());
    assert_eq!(reports[1].line, 2);
}
