//! Relational client seam.
//!
//! The store never talks to a database directly: it renders statements for
//! the [`Session`]'s dialect and hands them over. [`sqlite::SqliteSession`] is
//! the bundled implementation.

pub mod sqlite;

pub use sqlite::SqliteSession;

use std::fmt;
use std::sync::Arc;

use crate::sql::dialect::Dialect;
use crate::sql::token::Statement;
use crate::value::Value;

/// Errors raised by a driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection lock poisoned")]
    Poisoned,

    #[error("session is closed")]
    Closed,

    #[error("connection is held by a transaction opened on this thread")]
    Busy,

    #[error("invalid database configuration: {0}")]
    Config(String),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Forward-only cursor over the rows of one query.
pub trait RowCursor: Send {
    /// Column names, in row order.
    fn columns(&self) -> &[String];

    /// Next row, or `None` once exhausted.
    fn next_row(&mut self) -> DriverResult<Option<Vec<Value>>>;

    /// Release the cursor. Calling it again is a no-op.
    fn close(&mut self) -> DriverResult<()>;
}

/// A connection able to run statements.
pub trait Session: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Run a query and return its rows.
    fn query(&self, statement: &Statement) -> DriverResult<Box<dyn RowCursor>>;

    /// Run a statement and return the number of rows it changed.
    fn execute(&self, statement: &Statement) -> DriverResult<u64>;

    /// Open a transaction. Statements issued through the returned
    /// [`Transaction::session`] run inside it; statements issued through any
    /// other session never do.
    fn begin(self: Arc<Self>) -> DriverResult<Transaction>;
}

/// Commit/rollback half of an open transaction.
pub trait TransactionControl: Send {
    fn commit(self: Box<Self>) -> DriverResult<()>;

    fn rollback(self: Box<Self>) -> DriverResult<()>;
}

/// An open transaction.
///
/// Dropping it without calling [`commit`](Transaction::commit) rolls back.
pub struct Transaction {
    session: Arc<dyn Session>,
    control: Box<dyn TransactionControl>,
}

impl Transaction {
    pub fn new(session: Arc<dyn Session>, control: Box<dyn TransactionControl>) -> Self {
        Self { session, control }
    }

    /// Session bound to this transaction.
    pub fn session(&self) -> Arc<dyn Session> {
        Arc::clone(&self.session)
    }

    pub fn commit(self) -> DriverResult<()> {
        self.control.commit()
    }

    pub fn rollback(self) -> DriverResult<()> {
        self.control.rollback()
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("dialect", &self.session.dialect())
            .finish()
    }
}
