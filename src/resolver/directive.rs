use std::path::PathBuf;

use serde::Serialize;

/// A typed view of one line of a directive file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Directive {
    /// `#r @"<path>"`: add an assembly reference.
    Reference(PathBuf),
    /// `#load @"<path>"`: run an initialization script.
    Load(PathBuf),
    /// `// ...` header line, raw text after the slashes.
    Comment(String),
    /// Anything else, verbatim.
    Other(String),
}

impl Directive {
    pub fn parse(line: &str) -> Directive {
        let trimmed = line.trim();
        if let Some(text) = trimmed.strip_prefix("//") {
            return Directive::Comment(text.to_string());
        }
        if let Some(path) = operand(trimmed, "#r") {
            return Directive::Reference(path);
        }
        if let Some(path) = operand(trimmed, "#load") {
            return Directive::Load(path);
        }
        Directive::Other(line.to_string())
    }

    /// Render back to directive syntax.
    pub fn to_line(&self) -> String {
        match self {
            Directive::Reference(path) => format!("#r @\"{}\"", path.display()),
            Directive::Load(path) => format!("#load @\"{}\"", path.display()),
            Directive::Comment(text) => format!("//{}", text),
            Directive::Other(line) => line.clone(),
        }
    }
}

/// The quoted path after `keyword`, accepting `@"..."` and `"..."`.
fn operand(line: &str, keyword: &str) -> Option<PathBuf> {
    let rest = line.strip_prefix(keyword)?;
    // `#r` must not match `#region`.
    if !rest.starts_with(|c: char| c.is_whitespace() || c == '@' || c == '"') {
        return None;
    }
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('@').unwrap_or(rest);
    let path = rest.strip_prefix('"')?.strip_suffix('"')?;
    if path.is_empty() {
        return None;
    }
    Some(PathBuf::from(path))
}
