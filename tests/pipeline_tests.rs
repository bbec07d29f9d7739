//! End-to-end tests of the SQL core: normalize → segment → classify →
//! organize → emit.

use pretty_assertions::assert_eq;
use sqlcell::prelude::*;

const SAMPLES: [&str; 8] = [
    "",
    "SELECT 1",
    "Modified SQL from: foo\nCREATE TABLE a (x INT);\nINSERT INTO a VALUES (1);\nSELECT * FROM a;",
    "```sql\nWITH c AS (SELECT 1) SELECT * FROM c;\nUPDATE t SET v = 'x;y';\n```",
    "\"\"\"\n-- setup\nCREATE VIEW v AS SELECT 1;\nDELETE FROM t WHERE id = 2\n\"\"\"",
    "Here you go:\n```\nMERGE INTO t USING s ON t.id = s.id WHEN MATCHED THEN UPDATE SET v = s.v;\nSELECT 'it\\'s';",
    "TRUNCATE TABLE t; GRANT SELECT ON t TO bob; EXPLAIN DELETE FROM t;",
    "SELECT 'unterminated; DROP TABLE t;",
];

/// Count top-level `;` the slow way, and whether non-blank text follows
/// the last one.
fn manual_boundaries(text: &str) -> (usize, bool) {
    let mut count = 0;
    let mut last_end = 0;
    let mut inside = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '\'' {
            inside = !inside;
        } else if c == ';' && !inside {
            count += 1;
            last_end = i + 1;
        }
    }
    (count, !text[last_end..].trim().is_empty())
}

#[test]
fn test_end_to_end_scenario() {
    let raw = "Modified SQL from: foo\nCREATE TABLE a (x INT);\nINSERT INTO a VALUES (1);\nSELECT * FROM a;";

    let text = normalize(raw);
    assert_eq!(
        text,
        "CREATE TABLE a (x INT);\nINSERT INTO a VALUES (1);\nSELECT * FROM a;"
    );

    let statements: Vec<String> = segment(&text).collect();
    assert_eq!(statements.len(), 3);

    let kinds: Vec<StatementKind> = statements.iter().map(|s| classify(s)).collect();
    assert_eq!(kinds, StatementKind::ALL);

    let blocks = organize(statements);
    assert!(blocks.iter().all(|(_, block)| !block.is_empty()));

    let artifact = emit(blocks);
    assert_eq!(
        artifact.to_document(),
        "CREATE TABLE a (x INT);\n\nINSERT INTO a VALUES (1);\n\nSELECT * FROM a;\n"
    );
}

#[test]
fn test_process_matches_stages() {
    for raw in SAMPLES {
        let staged = emit(organize(segment(&normalize(raw))));
        assert_eq!(process(raw), staged, "input: {raw:?}");
    }
}

#[test]
fn test_normalize_idempotent() {
    for raw in SAMPLES {
        let once = normalize(raw);
        assert_eq!(normalize(&once), once, "input: {raw:?}");
    }
}

#[test]
fn test_segment_boundaries_match_manual_count() {
    for raw in SAMPLES {
        let text = normalize(raw);
        if text.is_empty() {
            continue;
        }
        let statements: Vec<String> = segment(&text).collect();
        let (boundaries, has_tail) = manual_boundaries(&text);
        assert_eq!(
            statements.len(),
            boundaries + usize::from(has_tail),
            "input: {raw:?}"
        );
        assert!(statements.iter().all(|s| !s.trim().is_empty()));
    }
}

#[test]
fn test_partition_completeness() {
    for raw in SAMPLES {
        let statements: Vec<String> = segment(&normalize(raw)).collect();
        let partition = Partition::from_statements(statements.clone());
        assert_eq!(partition.len(), statements.len());

        for kind in StatementKind::ALL {
            let expected: Vec<&String> = statements.iter().filter(|s| classify(s) == kind).collect();
            let actual: Vec<&String> = partition.list(kind).iter().collect();
            assert_eq!(actual, expected, "kind {kind} for input {raw:?}");
        }
    }
}

#[test]
fn test_quote_awareness() {
    let statements: Vec<String> = segment("INSERT INTO t VALUES ('a;b');").collect();
    assert_eq!(statements, vec!["INSERT INTO t VALUES ('a;b');"]);
}

#[test]
fn test_classifier_skips_comment() {
    assert_eq!(
        classify("-- comment\nCREATE TABLE t (id INT);"),
        StatementKind::SchemaDefinition
    );
}

#[test]
fn test_fence_extraction() {
    assert_eq!(normalize("```sql\nSELECT 1;\n```"), "SELECT 1;");
}

#[test]
fn test_blank_output_still_has_a_unit() {
    for raw in ["", "   ", "```sql\n```", "Modified SQL from: x"] {
        let artifact = process(raw);
        assert_eq!(artifact.units().len(), 1, "input: {raw:?}");
        assert!(artifact.is_blank());
        assert_eq!(artifact.to_document(), "\n");
        assert_eq!(Notebook::from(&artifact).cells.len(), 1);
    }
}

#[test]
fn test_mixed_script_reorders_by_kind() {
    let raw = "```sql\nSELECT * FROM catalog.s.a;\nINSERT INTO catalog.s.a VALUES (1);\nCREATE TABLE catalog.s.b (y INT);\nSELECT 2;\n```";
    let artifact = process(raw);
    let sources: Vec<&str> = artifact.units().iter().map(|u| u.source.as_str()).collect();
    assert_eq!(
        sources,
        vec![
            "CREATE TABLE catalog.s.b (y INT);",
            "INSERT INTO catalog.s.a VALUES (1);",
            "SELECT * FROM catalog.s.a;\n\nSELECT 2;",
        ]
    );
}
