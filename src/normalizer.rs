//! Output normalizer.
//!
//! Language-model output arrives decorated: wrapped in triple quotes, fenced
//! in markdown code blocks, or prefixed with a `Modified SQL from:` line.
//! [`normalize`] strips those artifacts and returns plain SQL text.
//!
//! ```text
//! """                    ```sql                 Modified SQL from: a.sql
//! SELECT 1;      or      SELECT 1;      or      SELECT 1;
//! """                    ```
//!                  └──────────┬──────────┘
//!                         SELECT 1;
//! ```

use nom::{
    bytes::complete::{tag, take_while},
    combinator::eof,
    IResult,
};

const TRIPLE_QUOTE: &str = "\"\"\"";
const FENCE: &str = "```";

/// Leading lines the model sometimes echoes back before the SQL.
const DESCRIPTOR_MARKERS: [&str; 2] = ["# Modified SQL from:", "Modified SQL from:"];

/// Normalize raw model output into plain SQL text.
///
/// Never fails: empty input gives an empty string, a fence without a closer
/// keeps everything after the opener. The result is a fixpoint, so
/// `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let mut current = normalize_once(raw);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        // Every rewrite in normalize_once strictly shortens the text.
        current = next;
    }
}

/// One pass: unwrap triple quotes, then either extract the first fenced
/// block or drop a descriptor preamble.
fn normalize_once(raw: &str) -> String {
    let cleaned = strip_triple_quotes(raw.trim());
    let lines: Vec<&str> = cleaned.lines().collect();

    if let Some(open) = lines.iter().position(|line| is_fence_opener(line)) {
        let body = &lines[open + 1..];
        let body = match body.iter().position(|line| line.trim() == FENCE) {
            Some(close) => &body[..close],
            None => body,
        };
        return body.join("\n").trim().to_string();
    }

    match lines.split_first() {
        Some((first, rest)) if is_descriptor(first) => rest.join("\n").trim().to_string(),
        _ => cleaned.to_string(),
    }
}

/// Strip one surrounding `"""` layer, re-trimming the inside.
fn strip_triple_quotes(text: &str) -> &str {
    if text.starts_with(TRIPLE_QUOTE) && text.ends_with(TRIPLE_QUOTE) {
        // Shorter than two wrappers means the quotes overlap: nothing inside.
        text.get(TRIPLE_QUOTE.len()..text.len().saturating_sub(TRIPLE_QUOTE.len()))
            .unwrap_or("")
            .trim()
    } else {
        text
    }
}

/// A fence opener is a line holding only ``` and an optional language tag.
fn is_fence_opener(line: &str) -> bool {
    parse_fence_opener(line.trim()).is_ok()
}

fn parse_fence_opener(input: &str) -> IResult<&str, &str> {
    let (input, _) = tag(FENCE)(input)?;
    let (input, language) = take_while(|c: char| {
        c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | '.')
    })(input)?;
    let (input, _) = eof(input)?;
    Ok((input, language))
}

fn is_descriptor(line: &str) -> bool {
    let line = line.trim_start();
    DESCRIPTOR_MARKERS
        .iter()
        .any(|marker| line.starts_with(marker))
}
