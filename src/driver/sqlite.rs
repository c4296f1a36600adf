//! SQLite session over `rusqlite`.
//!
//! One connection shared by every clone of a session. A query buffers its raw
//! rows while the connection lock is held, so the cursor handed back owns its
//! data and the connection is free for the next statement; typed
//! materialization stays lazy.
//!
//! An open transaction owns the connection until it commits or rolls back.
//! Statements from any other session over the same connection wait for it to
//! finish; from the thread that opened it they fail with [`DriverError::Busy`]
//! instead of deadlocking.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::Duration;

use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};

use super::{DriverError, DriverResult, RowCursor, Session, Transaction, TransactionControl};
use crate::config::DatabaseSettings;
use crate::sql::dialect::Dialect;
use crate::sql::token::Statement;
use crate::value::Value;

/// The transaction currently owning the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Owner {
    id: u64,
    thread: ThreadId,
}

#[derive(Debug)]
struct Shared {
    conn: Mutex<Connection>,
    /// Lock order: `owner` before `conn`.
    owner: Mutex<Option<Owner>>,
    released: Condvar,
    next_id: AtomicU64,
}

/// SQLite implementation of [`Session`].
///
/// A session is either the root session, or bound to one open transaction.
#[derive(Debug, Clone)]
pub struct SqliteSession {
    shared: Arc<Shared>,
    scope: Option<u64>,
}

impl SqliteSession {
    /// Open the database named by `settings`.
    pub fn open(settings: &DatabaseSettings) -> DriverResult<Self> {
        let conn = if settings.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            let path = settings
                .resolved_path()
                .map_err(|e| DriverError::Config(e.to_string()))?;
            Connection::open(path)?
        };
        conn.busy_timeout(Duration::from_millis(settings.busy_timeout_ms))?;
        Ok(Self::from_connection(conn))
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> DriverResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            shared: Arc::new(Shared {
                conn: Mutex::new(conn),
                owner: Mutex::new(None),
                released: Condvar::new(),
                next_id: AtomicU64::new(1),
            }),
            scope: None,
        }
    }

    /// Run raw SQL without parameters, e.g. to create fixture tables.
    pub fn execute_batch(&self, sql: &str) -> DriverResult<()> {
        self.with_conn(|conn| Ok(conn.execute_batch(sql)?))
    }

    /// Wait until this session may use the connection.
    ///
    /// A transaction-bound session may only run while its transaction still
    /// owns the connection. The root session waits for any open transaction.
    fn claim(&self) -> DriverResult<MutexGuard<'_, Option<Owner>>> {
        let owner = self
            .shared
            .owner
            .lock()
            .map_err(|_| DriverError::Poisoned)?;
        let current = *owner;
        match self.scope {
            Some(id) => match current {
                Some(current) if current.id == id => Ok(owner),
                _ => Err(DriverError::Closed),
            },
            None => {
                let me = thread::current().id();
                if matches!(current, Some(current) if current.thread == me) {
                    return Err(DriverError::Busy);
                }
                self.shared
                    .released
                    .wait_while(owner, |owner| owner.is_some())
                    .map_err(|_| DriverError::Poisoned)
            }
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> DriverResult<T>) -> DriverResult<T> {
        let _claim = self.claim()?;
        let conn = self
            .shared
            .conn
            .lock()
            .map_err(|_| DriverError::Poisoned)?;
        f(&conn)
    }
}

impl Session for SqliteSession {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&self, statement: &Statement) -> DriverResult<Box<dyn RowCursor>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&statement.sql)?;
            let columns: Vec<String> =
                stmt.column_names().into_iter().map(String::from).collect();
            let width = columns.len();

            let mut buffered = VecDeque::new();
            let mut rows = stmt.query(params_from_iter(statement.params.iter()))?;
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(width);
                for i in 0..width {
                    values.push(value_from_ref(row.get_ref(i)?));
                }
                buffered.push_back(values);
            }

            Ok(Box::new(BufferedRows {
                columns,
                rows: buffered,
                closed: false,
            }) as Box<dyn RowCursor>)
        })
    }

    fn execute(&self, statement: &Statement) -> DriverResult<u64> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&statement.sql)?;
            let changed = stmt.execute(params_from_iter(statement.params.iter()))?;
            Ok(changed as u64)
        })
    }

    fn begin(self: Arc<Self>) -> DriverResult<Transaction> {
        if self.scope.is_some() {
            return Err(DriverError::Busy);
        }

        let mut owner = self.claim()?;
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let conn = self
                .shared
                .conn
                .lock()
                .map_err(|_| DriverError::Poisoned)?;
            conn.execute_batch("BEGIN")?;
        }
        *owner = Some(Owner {
            id,
            thread: thread::current().id(),
        });
        drop(owner);

        let bound = SqliteSession {
            shared: Arc::clone(&self.shared),
            scope: Some(id),
        };
        let control = SqliteTransaction {
            shared: Arc::clone(&self.shared),
            id,
            finished: false,
        };
        Ok(Transaction::new(Arc::new(bound), Box::new(control)))
    }
}

/// Rows of one query, fetched up front.
struct BufferedRows {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
    closed: bool,
}

impl RowCursor for BufferedRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> DriverResult<Option<Vec<Value>>> {
        if self.closed {
            return Err(DriverError::Closed);
        }
        Ok(self.rows.pop_front())
    }

    fn close(&mut self) -> DriverResult<()> {
        self.closed = true;
        self.rows.clear();
        Ok(())
    }
}

struct SqliteTransaction {
    shared: Arc<Shared>,
    id: u64,
    finished: bool,
}

impl SqliteTransaction {
    /// Run `sql` and hand the connection back to waiting sessions.
    fn finish(&mut self, sql: &str) -> DriverResult<()> {
        self.finished = true;
        let mut owner = self
            .shared
            .owner
            .lock()
            .map_err(|_| DriverError::Poisoned)?;
        if !matches!(*owner, Some(current) if current.id == self.id) {
            return Err(DriverError::Closed);
        }

        let result = match self.shared.conn.lock() {
            Ok(conn) => {
                let result = conn.execute_batch(sql).map_err(DriverError::from);
                // A failed COMMIT can leave the transaction open.
                if result.is_err() && !conn.is_autocommit() {
                    let _ = conn.execute_batch("ROLLBACK");
                }
                result
            }
            Err(_) => Err(DriverError::Poisoned),
        };
        *owner = None;
        drop(owner);
        self.shared.released.notify_all();
        result
    }
}

impl TransactionControl for SqliteTransaction {
    fn commit(mut self: Box<Self>) -> DriverResult<()> {
        self.finish("COMMIT")
    }

    fn rollback(mut self: Box<Self>) -> DriverResult<()> {
        self.finish("ROLLBACK")
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if !self.finished {
            // Nothing to report to; the connection is released either way.
            let _ = self.finish("ROLLBACK");
        }
    }
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Value::Text(text.to_owned()),
            Err(_) => Value::Blob(bytes.to_vec()),
        },
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(n) => ToSqlOutput::Owned(SqlValue::Integer(*n)),
            Value::Real(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(*b as i64)),
            Value::Timestamp(ts) => ToSqlOutput::Owned(SqlValue::Text(Value::timestamp_text(ts))),
            Value::Uuid(id) => ToSqlOutput::Owned(SqlValue::Text(id.to_string())),
            Value::Json(json) => ToSqlOutput::Owned(SqlValue::Text(json.to_string())),
        })
    }
}
