//! Statement segmenter.
//!
//! Splits normalized SQL into statements on top-level `;`. A single quote
//! toggles string-literal context and a backslash consumes the character
//! after it, so `'a;b'` and `'it\'s'` never split.
//!
//! The scan is lazy: [`segment`] returns an iterator that walks the text
//! once, left to right, yielding each statement as soon as its terminator
//! is seen.

use std::iter::FusedIterator;

/// Split `text` into trimmed, non-empty statements.
///
/// Statements cut at a `;` keep it. A trailing statement with no
/// terminator gets one appended. Unterminated quotes are accepted as-is.
pub fn segment(text: &str) -> Segments<'_> {
    Segments { text, pos: 0 }
}

/// Iterator over the statements of a SQL text. See [`segment`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a str,
    pos: usize,
}

/// Quote and escape context while scanning one statement.
#[derive(Debug, Default, Clone, Copy)]
struct ScanState {
    inside_quote: bool,
    escape_next: bool,
}

impl ScanState {
    /// Feed one character; returns true if it terminates the statement.
    fn step(&mut self, c: char) -> bool {
        if self.escape_next {
            self.escape_next = false;
            return false;
        }
        match c {
            '\\' => self.escape_next = true,
            '\'' => self.inside_quote = !self.inside_quote,
            ';' => return !self.inside_quote,
            _ => {}
        }
        false
    }
}

/// Byte offset just past the next top-level `;` in `rest`.
fn find_terminator(rest: &str) -> Option<usize> {
    let mut state = ScanState::default();
    rest.char_indices()
        .find(|&(_, c)| state.step(c))
        .map(|(i, c)| i + c.len_utf8())
}

impl Iterator for Segments<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while self.pos < self.text.len() {
            let rest = &self.text[self.pos..];
            match find_terminator(rest) {
                Some(end) => {
                    self.pos += end;
                    let statement = rest[..end].trim();
                    if !statement.is_empty() {
                        return Some(statement.to_string());
                    }
                }
                None => {
                    self.pos = self.text.len();
                    let tail = rest.trim();
                    if tail.is_empty() {
                        return None;
                    }
                    if tail.ends_with(';') {
                        return Some(tail.to_string());
                    }
                    return Some(format!("{tail};"));
                }
            }
        }
        None
    }
}

impl FusedIterator for Segments<'_> {}
