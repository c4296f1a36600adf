//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features:
//! - ANSI identifier quoting (`"`)
//! - Numbered `$n` placeholders
//! - jsonb path operators (`#>`, `#>>`)

use super::super::json::{JsonKind, PathSegment};
use super::super::token::TokenStream;
use super::helpers;
use super::SqlDialect;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn placeholder(&self, position: usize) -> String {
        helpers::placeholder_dollar(position)
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)

    fn emit_json_extract(
        &self,
        base: &TokenStream,
        path: &[PathSegment],
        kind: JsonKind,
    ) -> TokenStream {
        helpers::emit_json_extract_postgres(base, path, kind)
    }

    fn emit_json_elements(
        &self,
        base: &TokenStream,
        path: &[PathSegment],
        alias: &str,
    ) -> TokenStream {
        helpers::emit_json_elements_postgres(base, path, alias)
    }
}
