//! # rowbind
//!
//! Typed mapping of application records to relational rows.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Entity binding (record, schema, field tree)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [query builder + conditions]
//! ┌─────────────────────────────────────────────────────────┐
//! │               Query (projection, filters)                │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compile against the schema]
//! ┌─────────────────────────────────────────────────────────┐
//! │           Statement (dialect SQL + parameters)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [driver session]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Row cursor → ResultSet → typed records            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rowbind::driver::SqliteSession;
//! use rowbind::model::{Repository, RepositoryQuery, RepositoryStore};
//!
//! let store = RepositoryStore::new(Arc::new(SqliteSession::open_in_memory()?));
//! let mut repo = Repository::new();
//! repo.slug = "rowbind".into();
//! store.insert(&mut repo)?;
//!
//! let found = store.find_one(RepositoryQuery::new().find_by_slug("rowbind"))?;
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod log;
pub mod model;
pub mod query;
pub mod record;
pub mod schema;
pub mod sql;
pub mod store;
pub mod value;

pub use error::{Error, RecordStateError, Result};
pub use log::Logger;
pub use query::{asc, desc, Condition, Projection, Query, ScalarOp};
pub use record::{Address, Record, RecordState};
pub use schema::{JsonPath, Schema, SchemaField};
pub use sql::dialect::Dialect;
pub use store::{ResultSet, Store};
pub use value::{FromValue, Value};
