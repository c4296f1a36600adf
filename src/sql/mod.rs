//! SQL generation module.
//!
//! This module provides a type-safe SQL builder that renders parameterized
//! statements for SQLite and PostgreSQL. It includes:
//!
//! - [`select`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`json`] - Paths into structured (JSON) columns
//! - [`dml`] - Data Manipulation Language (INSERT, UPDATE, DELETE)
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod dml;
pub mod expr;
pub mod json;
pub mod select;
pub mod token;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    col, count_star, element, json_extract, param, star, table_col, BinaryOperator, Expr, ExprExt,
};
pub use json::{JsonKind, PathSegment};
pub use select::{OrderByExpr, Select, SortDir, TableRef};
pub use token::{Statement, Token, TokenStream};

// Re-export DML types
pub use dml::{Delete, Insert, Update};
