//! Statement classifier.
//!
//! Sorts a statement into one of three kinds by its leading keyword, after
//! skipping `--` comment lines. Statements with no recognized keyword fall
//! back to a scan for embedded mutation keywords, then to [`StatementKind::Query`].

use std::fmt;

use nom::{branch::alt, bytes::complete::tag, combinator::value, IResult};
use serde::{Deserialize, Serialize};

/// The category a statement is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// CREATE, DROP, ALTER.
    SchemaDefinition,
    /// INSERT, UPDATE, MERGE, DELETE.
    DataMutation,
    /// SELECT, WITH, and anything unrecognized.
    Query,
}

impl StatementKind {
    /// All kinds in output order.
    pub const ALL: [StatementKind; 3] = [
        StatementKind::SchemaDefinition,
        StatementKind::DataMutation,
        StatementKind::Query,
    ];
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::SchemaDefinition => write!(f, "schema_definition"),
            StatementKind::DataMutation => write!(f, "data_mutation"),
            StatementKind::Query => write!(f, "query"),
        }
    }
}

/// Keywords that mark a mutation buried inside an otherwise unrecognized statement.
const EMBEDDED_MUTATIONS: [&str; 4] = [" insert ", " update ", " delete ", " merge "];

/// Classify a statement. Total: every input gets a kind.
pub fn classify(statement: &str) -> StatementKind {
    let lowered = skip_line_comments(statement).to_lowercase();

    if let Ok((_, kind)) = leading_keyword(&lowered) {
        return kind;
    }

    if EMBEDDED_MUTATIONS
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        return StatementKind::DataMutation;
    }

    StatementKind::Query
}

/// Drop leading whitespace and whole `--` comment lines.
///
/// A comment with no newline after it is left in place.
fn skip_line_comments(statement: &str) -> &str {
    let mut rest = statement.trim_start();
    while rest.starts_with("--") {
        match rest.find('\n') {
            Some(newline) => rest = rest[newline + 1..].trim_start(),
            None => break,
        }
    }
    rest
}

/// Match the leading keyword of a lower-cased statement.
fn leading_keyword(input: &str) -> IResult<&str, StatementKind> {
    alt((
        value(
            StatementKind::SchemaDefinition,
            alt((tag("create "), tag("drop "), tag("alter "))),
        ),
        value(
            StatementKind::DataMutation,
            alt((tag("insert "), tag("update "), tag("merge "), tag("delete "))),
        ),
        value(StatementKind::Query, alt((tag("select "), tag("with ")))),
    ))(input)
}
