//! Record store: CRUD and transactions for one entity type.
//!
//! A [`Store`] renders statements for its session's dialect, runs them and
//! keeps each record's [`RecordState`](crate::record::RecordState) in step
//! with what was written.

mod result_set;

pub use result_set::{Records, ResultSet};

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::driver::{DriverError, RowCursor, Session};
use crate::error::{Error, RecordStateError, Result};
use crate::log::Logger;
use crate::query::{Condition, Query};
use crate::record::Record;
use crate::schema::{Schema, SchemaField};
use crate::sql::dml::{Delete, Insert, Update};
use crate::sql::expr::{col, param, Expr, ExprExt};
use crate::sql::token::Statement;
use crate::value::{FromValue, Value};

pub struct Store<R: Record> {
    session: Arc<dyn Session>,
    logger: Logger,
    in_transaction: bool,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Clone for Store<R> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            logger: self.logger.clone(),
            in_transaction: self.in_transaction,
            _record: PhantomData,
        }
    }
}

impl<R: Record> fmt::Debug for Store<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("entity", &R::schema().entity())
            .field("dialect", &self.session.dialect())
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}

impl<R: Record> Store<R> {
    /// Store over `session`, with logging disabled.
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self {
            session,
            logger: Logger::disabled(),
            in_transaction: false,
            _record: PhantomData,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Whether this store runs inside a transaction.
    pub fn is_in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn schema(&self) -> &'static Schema<R> {
        R::schema()
    }

    // =========================================================================
    // Statement execution
    // =========================================================================

    fn failed(&self, operation: &'static str, source: DriverError) -> Error {
        let entity = self.schema().entity();
        self.logger
            .error(format_args!("{} {} failed: {}", entity, operation, source));
        Error::collaborator(entity, operation, source)
    }

    fn trace(&self, operation: &'static str, statement: &Statement) {
        self.logger.debug(format_args!(
            "{} {}: {} ({} params)",
            self.schema().entity(),
            operation,
            statement.sql,
            statement.params.len()
        ));
    }

    fn exec(&self, operation: &'static str, statement: &Statement) -> Result<u64> {
        self.trace(operation, statement);
        self.session
            .execute(statement)
            .map_err(|e| self.failed(operation, e))
    }

    fn fetch(&self, operation: &'static str, statement: &Statement) -> Result<Box<dyn RowCursor>> {
        self.trace(operation, statement);
        self.session
            .query(statement)
            .map_err(|e| self.failed(operation, e))
    }

    fn by_id(&self, record: &R) -> Expr {
        col(self.schema().id()).eq(param(record.id()))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert a transient record with every schema column.
    pub fn insert(&self, record: &mut R) -> Result<()> {
        if record.state().is_persisted() {
            return Err(RecordStateError::AlreadyPersisted.into());
        }
        record.before_save()?;

        let schema = self.schema();
        let values = schema
            .columns()
            .iter()
            .map(|c| record.value_of(c.name).map(param))
            .collect::<Result<Vec<Expr>>>()?;

        let statement = Insert::into(schema.table())
            .columns(schema.column_names())
            .values(values)
            .to_statement(self.session.dialect());
        self.exec("insert", &statement)?;

        record.state_mut().mark_stored();
        Ok(())
    }

    /// Update a persisted, writable record.
    ///
    /// With no `columns`, every non-identifier column is written. Returns the
    /// number of rows changed.
    pub fn update(&self, record: &mut R, columns: &[SchemaField]) -> Result<u64> {
        let state = record.state();
        if !state.is_persisted() {
            return Err(RecordStateError::NotPersisted.into());
        }
        if !state.is_writable() {
            return Err(RecordStateError::NotWritable.into());
        }

        let schema = self.schema();
        let names: Vec<&'static str> = if columns.is_empty() {
            schema
                .columns()
                .iter()
                .map(|c| c.name)
                .filter(|name| *name != schema.id())
                .collect()
        } else {
            let mut names = Vec::with_capacity(columns.len());
            for field in columns {
                let SchemaField::Column(name) = field else {
                    return Err(Error::unknown_column(schema.entity(), field.to_string()));
                };
                let column = schema.require(name)?;
                if column.name != schema.id() && !names.contains(&column.name) {
                    names.push(column.name);
                }
            }
            names
        };
        if names.is_empty() {
            return Ok(0);
        }

        record.before_save()?;

        let mut update = Update::table(schema.table());
        for name in names {
            update = update.set(name, param(record.value_of(name)?));
        }
        let statement = update
            .filter(self.by_id(record))
            .to_statement(self.session.dialect());
        self.exec("update", &statement)
    }

    /// Insert a transient record, update a persisted one.
    ///
    /// Returns `false` after an insert; after an update, whether a row changed.
    pub fn save(&self, record: &mut R) -> Result<bool> {
        if !record.state().is_persisted() {
            self.insert(record)?;
            return Ok(false);
        }
        Ok(self.update(record, &[])? > 0)
    }

    /// Delete by identifier. The record becomes transient again.
    pub fn delete(&self, record: &mut R) -> Result<()> {
        let statement = Delete::from(self.schema().table())
            .filter(self.by_id(record))
            .to_statement(self.session.dialect());
        if self.exec("delete", &statement)? == 0 {
            return Err(Error::NotFound);
        }
        record.state_mut().mark_transient();
        Ok(())
    }

    /// Re-read every column of `record` from the store.
    pub fn reload(&self, record: &mut R) -> Result<()> {
        let query = Query::new()
            .filter(Condition::eq(
                SchemaField::column(self.schema().id()),
                record.id(),
            ))
            .limit(1);
        let mut fresh = self.find(query)?.one()?;
        fresh.state_mut().mark_stored();
        *record = fresh;
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn find(&self, query: Query) -> Result<ResultSet<R>> {
        let compiled = query.compile_select(self.schema(), self.session.dialect())?;
        let cursor = self.fetch("find", &compiled.statement)?;
        Ok(ResultSet::new(cursor, compiled.columns, compiled.writable))
    }

    /// First match of `query`; `NotFound` if none.
    pub fn find_one(&self, query: Query) -> Result<R> {
        self.find(query.limit(1).offset(0))?.one()
    }

    /// Number of rows matching `query`. Ordering, limit and offset are ignored.
    pub fn count(&self, query: Query) -> Result<i64> {
        let statement = query.compile_count(self.schema(), self.session.dialect())?;
        let mut cursor = self.fetch("count", &statement)?;
        let row = cursor
            .next_row()
            .map_err(|e| self.failed("count", e))?
            .ok_or(Error::NotFound)?;
        cursor.close().map_err(|e| self.failed("count", e))?;

        let value = row.into_iter().next().unwrap_or(Value::Null);
        i64::from_value(value).map_err(|e| Error::conversion("count", e))
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Run `callback` inside a transaction.
    ///
    /// The callback receives a store bound to the transaction. An error from
    /// the callback rolls back and is returned; success commits.
    pub fn transaction<F, T>(&self, callback: F) -> Result<T>
    where
        F: FnOnce(&Store<R>) -> Result<T>,
    {
        self.transaction_with(Some(callback))
    }

    /// [`transaction`](Self::transaction) with an optional callback.
    ///
    /// `None` fails with `InvalidTransactionCallback`; a store already inside
    /// a transaction fails with `NestedTransaction`.
    pub fn transaction_with<F, T>(&self, callback: Option<F>) -> Result<T>
    where
        F: FnOnce(&Store<R>) -> Result<T>,
    {
        let Some(callback) = callback else {
            return Err(Error::InvalidTransactionCallback);
        };
        if self.in_transaction {
            return Err(Error::NestedTransaction);
        }

        let entity = self.schema().entity();
        let tx = Arc::clone(&self.session)
            .begin()
            .map_err(|e| self.failed("begin", e))?;
        let bound = Store {
            session: tx.session(),
            logger: self.logger.clone(),
            in_transaction: true,
            _record: PhantomData,
        };

        match callback(&bound) {
            Ok(value) => {
                tx.commit().map_err(|e| self.failed("commit", e))?;
                Ok(value)
            }
            Err(err) => {
                self.logger
                    .warn(format_args!("{} transaction rolled back: {}", entity, err));
                if let Err(e) = tx.rollback() {
                    self.failed("rollback", e);
                }
                Err(err)
            }
        }
    }

    // =========================================================================
    // Panicking variants, for tests and fixtures
    // =========================================================================

    pub fn must_find(&self, query: Query) -> ResultSet<R> {
        self.find(query)
            .unwrap_or_else(|e| panic!("must_find {}: {}", R::schema().entity(), e))
    }

    pub fn must_find_one(&self, query: Query) -> R {
        self.find_one(query)
            .unwrap_or_else(|e| panic!("must_find_one {}: {}", R::schema().entity(), e))
    }

    pub fn must_count(&self, query: Query) -> i64 {
        self.count(query)
            .unwrap_or_else(|e| panic!("must_count {}: {}", R::schema().entity(), e))
    }
}
