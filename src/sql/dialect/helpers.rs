//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use super::super::json::{self, JsonKind, PathSegment};
use super::super::token::{Token, TokenStream};

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: SQLite, Postgres
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

// =============================================================================
// Placeholders
// =============================================================================

/// Anonymous positional placeholder.
/// Used by: SQLite
pub fn placeholder_question(_position: usize) -> String {
    "?".into()
}

/// Numbered placeholder, 1-based.
/// Used by: Postgres
pub fn placeholder_dollar(position: usize) -> String {
    format!("${}", position)
}

// =============================================================================
// Pagination
// =============================================================================

/// Bounds beyond `i64::MAX` saturate instead of wrapping negative.
fn bound(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Emit LIMIT ... OFFSET ... (standard SQL).
/// Used by: Postgres
pub fn emit_limit_offset_standard(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();

    if let Some(lim) = limit {
        ts.push(Token::Limit)
            .space()
            .push(Token::LitInt(bound(lim)));
    }

    if let Some(off) = offset {
        if limit.is_some() {
            ts.space();
        }
        ts.push(Token::Offset)
            .space()
            .push(Token::LitInt(bound(off)));
    }

    ts
}

/// Emit LIMIT ... OFFSET ..., with `LIMIT -1` standing in for a missing limit.
/// Used by: SQLite, whose grammar only accepts OFFSET after LIMIT
pub fn emit_limit_offset_required_limit(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    match (limit, offset) {
        (None, Some(off)) => {
            let mut ts = TokenStream::new();
            ts.push(Token::Limit)
                .space()
                .push(Token::LitInt(-1))
                .space()
                .push(Token::Offset)
                .space()
                .push(Token::LitInt(bound(off)));
            ts
        }
        _ => emit_limit_offset_standard(limit, offset),
    }
}

// =============================================================================
// JSON Access
// =============================================================================

/// `json_extract(base, '$.a.b')`
/// Used by: SQLite. The engine returns native SQL types, so `kind` is ignored.
pub fn emit_json_extract_sqlite(base: &TokenStream, path: &[PathSegment]) -> TokenStream {
    // json_each already yields SQL values for scalar elements.
    if path.is_empty() {
        return base.clone();
    }
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName("json_extract".into())).lparen();
    ts.append(base);
    ts.comma()
        .space()
        .push(Token::LitString(json::sqlite_path(path)))
        .rparen();
    ts
}

/// `json_each(base, '$.a') AS "alias"`
/// Used by: SQLite
pub fn emit_json_elements_sqlite(
    base: &TokenStream,
    path: &[PathSegment],
    alias: &str,
) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName("json_each".into())).lparen();
    ts.append(base);
    ts.comma()
        .space()
        .push(Token::LitString(json::sqlite_path(path)))
        .rparen();
    ts.space().push(Token::As).space().push(Token::Ident(alias.into()));
    ts
}

/// `(base #>> '{a,b}')`, cast according to `kind`; `#>` keeps jsonb for `Any`.
/// Used by: Postgres
pub fn emit_json_extract_postgres(
    base: &TokenStream,
    path: &[PathSegment],
    kind: JsonKind,
) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.lparen();
    ts.append(base);
    let op = if kind == JsonKind::Any { "#>" } else { "#>>" };
    ts.space()
        .push(Token::Raw(op.into()))
        .space()
        .push(Token::LitString(json::pg_path(path)))
        .rparen();
    match kind {
        JsonKind::Number => {
            ts.push(Token::Raw("::numeric".into()));
        }
        JsonKind::Bool => {
            ts.push(Token::Raw("::boolean".into()));
        }
        JsonKind::Text | JsonKind::Any => {}
    }
    ts
}

/// `jsonb_array_elements(base #> '{a}') AS "alias"("value")`
/// Used by: Postgres
pub fn emit_json_elements_postgres(
    base: &TokenStream,
    path: &[PathSegment],
    alias: &str,
) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName("jsonb_array_elements".into()))
        .lparen();
    ts.append(&emit_json_extract_postgres(base, path, JsonKind::Any));
    ts.rparen();
    ts.space()
        .push(Token::As)
        .space()
        .push(Token::Ident(alias.into()))
        .lparen()
        .push(Token::Ident("value".into()))
        .rparen();
    ts
}
