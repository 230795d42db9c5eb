//! Inline package reference options.
//!
//! A reference spec is a comma-delimited list of `name=value` tokens:
//!
//! ```text
//! Newtonsoft.Json, 13.0.3, include='Odd,Name', version=1.0, privateassets=all
//! ```
//!
//! Commas inside a single-quoted span do not split, and `\'` is a literal
//! quote that does not open or close a span. Parsing never fails: malformed
//! text degrades to absent names and values.

use serde::Serialize;

mod group;

pub use group::{PackageDeclaration, PackageRequest};


// ─── Data Types ────────────────────────────────────────────────────

/// One comma-delimited token of a reference spec.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParsedOption {
    /// Lowercased option name. `None` when the token has no `=` or the
    /// name before it is blank.
    pub name: Option<String>,
    /// Trimmed value, case preserved. `None` when blank.
    pub value: Option<String>,
}

impl ParsedOption {
    pub fn new(name: Option<&str>, value: Option<&str>) -> Self {
        ParsedOption {
            name: name.map(str::to_string),
            value: value.map(str::to_string),
        }
    }
}

// ─── Tokenizing ────────────────────────────────────────────────────

/// Characters stripped from both ends of names and values.
const TRIM_CHARS: &[char] = &[' ', '\t', '\'', '"'];

/// Tokenize a reference spec.
///
/// The returned iterator is lazy and cheap to clone; cloning it (or calling
/// `parse` again) restarts the sequence. It always yields one token per
/// quote-aware comma-delimited group, so `parse("")` yields a single empty
/// token.
pub fn parse(text: &str) -> Options<'_> {
    Options { rest: Some(text) }
}

/// Iterator over the tokens of a reference spec. See [`parse`].
#[derive(Clone, Debug)]
pub struct Options<'a> {
    /// Unconsumed input; `None` once the last segment has been produced.
    rest: Option<&'a str>,
}

impl Iterator for Options<'_> {
    type Item = ParsedOption;

    fn next(&mut self) -> Option<ParsedOption> {
        let text = self.rest?;
        let (segment, rest) = split_segment(text);
        self.rest = rest;
        Some(parse_segment(segment))
    }
}

impl std::iter::FusedIterator for Options<'_> {}

/// Split off the first segment, honouring single-quoted spans.
///
/// Returns the segment and the remainder after the separating comma, or
/// `None` as the remainder when no unquoted comma is left.
fn split_segment(text: &str) -> (&str, Option<&str>) {
    let mut in_quote = false;
    let mut prev: Option<char> = None;
    for (i, c) in text.char_indices() {
        match c {
            '\'' if prev != Some('\\') => in_quote = !in_quote,
            ',' if !in_quote => return (&text[..i], Some(&text[i + 1..])),
            _ => {}
        }
        prev = Some(c);
    }
    (text, None)
}

fn parse_segment(segment: &str) -> ParsedOption {
    match segment.split_once('=') {
        Some((name, value)) => ParsedOption {
            name: non_blank(name).map(|n| n.to_lowercase()),
            value: non_blank(value).map(str::to_string),
        },
        None => ParsedOption {
            name: None,
            value: non_blank(segment).map(str::to_string),
        },
    }
}

/// Trim a raw name or value; blank (including whitespace-only) becomes `None`.
fn non_blank(raw: &str) -> Option<&str> {
    let trimmed = raw.trim_matches(TRIM_CHARS);
    if trimmed.trim().is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
