//! JSON path primitives shared by the expression AST and the dialects.

use std::borrow::Cow;
use std::fmt;

/// One step into a structured column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member.
    Key(Cow<'static, str>),
    /// Fixed array position.
    Index(usize),
    /// Any element of an array.
    Each,
}

impl PathSegment {
    pub fn key(name: &'static str) -> Self {
        PathSegment::Key(Cow::Borrowed(name))
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{}", k),
            PathSegment::Index(i) => write!(f, "{}", i),
            PathSegment::Each => write!(f, "*"),
        }
    }
}

/// Type of the value a path leads to; decides how it is extracted and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JsonKind {
    Text,
    Number,
    Bool,
    #[default]
    Any,
}

/// Split a path at its first [`PathSegment::Each`].
///
/// Returns the path to the array and the path inside each element.
pub fn split_at_each(path: &[PathSegment]) -> Option<(&[PathSegment], &[PathSegment])> {
    let pos = path.iter().position(|s| matches!(s, PathSegment::Each))?;
    Some((&path[..pos], &path[pos + 1..]))
}

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// SQLite JSON path: `$.links.clone[0].href`.
pub fn sqlite_path(path: &[PathSegment]) -> String {
    let mut out = String::from("$");
    for segment in path {
        match segment {
            PathSegment::Key(k) if is_plain_key(k) => {
                out.push('.');
                out.push_str(k);
            }
            PathSegment::Key(k) => {
                out.push_str(".\"");
                out.push_str(&k.replace('"', "\\\""));
                out.push('"');
            }
            PathSegment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            // Expanded by the caller through json_each.
            PathSegment::Each => out.push_str("[#]"),
        }
    }
    out
}

/// PostgreSQL text-array path: `{clone,0,href}`.
pub fn pg_path(path: &[PathSegment]) -> String {
    let parts: Vec<String> = path
        .iter()
        .map(|segment| match segment {
            PathSegment::Key(k) if is_plain_key(k) => k.to_string(),
            PathSegment::Key(k) => format!("\"{}\"", k.replace('"', "\\\"")),
            PathSegment::Index(i) => i.to_string(),
            PathSegment::Each => "*".to_string(),
        })
        .collect();
    format!("{{{}}}", parts.join(","))
}
