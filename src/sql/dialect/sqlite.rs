//! SQLite SQL dialect.
//!
//! SQLite features:
//! - ANSI identifier quoting (`"`)
//! - Anonymous `?` placeholders
//! - OFFSET only valid after LIMIT
//! - JSON1 functions (`json_extract`, `json_each`)

use super::super::json::{JsonKind, PathSegment};
use super::super::token::TokenStream;
use super::helpers;
use super::SqlDialect;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn placeholder(&self, position: usize) -> String {
        helpers::placeholder_question(position)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_required_limit(limit, offset)
    }

    fn emit_json_extract(
        &self,
        base: &TokenStream,
        path: &[PathSegment],
        _kind: JsonKind,
    ) -> TokenStream {
        helpers::emit_json_extract_sqlite(base, path)
    }

    fn emit_json_elements(
        &self,
        base: &TokenStream,
        path: &[PathSegment],
        alias: &str,
    ) -> TokenStream {
        helpers::emit_json_elements_sqlite(base, path, alias)
    }
}
